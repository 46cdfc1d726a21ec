use crate::config::{Environment, Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives used when `RUST_LOG` is unset.
fn default_directives(env: &Environment) -> &'static str {
    match env {
        Environment::Dev => "contractiq_backend=debug,tower_http=debug,info",
        Environment::Staging => "contractiq_backend=debug,tower_http=info,info",
        Environment::Prod => "contractiq_backend=info,tower_http=info,warn",
    }
}

pub fn init_logging(settings: &Settings) {
    let env = &settings.env;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(env)));

    // Source locations only help while developing
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(env.is_dev())
        .with_line_number(env.is_dev());

    if settings.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.pretty())
            .init();
    }

    tracing::info!(
        env = ?env,
        json = settings.log_json,
        "Logging initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_parse() {
        for env in [Environment::Dev, Environment::Staging, Environment::Prod] {
            assert!(EnvFilter::try_new(default_directives(&env)).is_ok());
        }
    }

    #[test]
    fn prod_is_quieter_than_dev() {
        assert!(default_directives(&Environment::Prod).ends_with("warn"));
        assert!(default_directives(&Environment::Dev).contains("contractiq_backend=debug"));
    }
}
