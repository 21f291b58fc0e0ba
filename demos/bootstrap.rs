use std::path::Path;
use std::sync::Arc;

use bootstrap_fnd::{AppContext, ConfigInput, Configurator, Container, Service, ServiceTarget};
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
[production.variable]
logDir = "%appDir%/log"

[production.service.Demo-Logger]
class = "FileLogger"
argument = ["%logDir%/app.log"]
alias = "logger"
run = true

[production.service.mailer]
run = true

[production.php]
"date.timezone" = "UTC"
max_execution_time = 30

[production.const]
APP_LOG_DIR = "%logDir%"

[development]
extends = "production"
mode = { debug = true }
"#;

#[derive(Debug)]
struct FileLogger {
    path: String,
}

struct Mailer;

fn bootstrap(app_dir: &Path) -> Result<AppContext, bootstrap_fnd::Error> {
    let mut container = Container::new();
    container.register_constructor("FileLogger", |definition| {
        let path = definition
            .options
            .arguments
            .as_ref()
            .and_then(|args| args.first())
            .and_then(|arg| arg.as_str())
            .unwrap_or("app.log")
            .to_string();
        Ok(Arc::new(FileLogger { path }) as Service)
    });
    container.register_constructor("Mailer::create", |_| Ok(Arc::new(Mailer) as Service));

    let configurator = Configurator::new()
        .with_default_service("mailer", ServiceTarget::Factory("Mailer::create".into()));
    let mut ctx = configurator.create_context("development", container)?;
    ctx.environment_mut()
        .set_variable("appDir", app_dir.display().to_string().into());

    let applied = configurator.load_config(ConfigInput::File(None), &mut ctx)?;
    println!("started: {:?}", applied.started_services());
    Ok(ctx)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let app_dir = tempfile::tempdir()?;
    std::fs::write(app_dir.path().join("config.toml"), CONFIG)?;

    let mut ctx = bootstrap(app_dir.path())?;

    let logger = ctx.container_mut().get_service("logger")?;
    if let Some(logger) = logger.downcast_ref::<FileLogger>() {
        println!("logger writes to {}", logger.path);
    }
    println!("debug mode: {}", ctx.environment().mode("debug"));
    println!("timezone: {:?}", ctx.settings().timezone());

    Ok(())
}
