use clap::Parser;

#[derive(Parser)]
#[command(name = "sms-mock")]
#[command(version, about = "Mock SMS provider: records send requests and lists them at /messages", long_about = None)]
struct Cli {
    /// Port number
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// The username for the sms service
    #[arg(long, default_value = "")]
    username: String,

    /// The password for the sms service
    #[arg(long, default_value = "")]
    password: String,

    /// Bind address (default all interfaces)
    #[arg(long, default_value = "0.0.0.0", value_name = "ADDR")]
    bind: String,
}

impl Cli {
    fn into_config(self) -> lib::config::Config {
        lib::config::Config {
            port: self.port,
            bind: self.bind,
            username: self.username,
            password: self.password,
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config();

    if let Err(e) = lib::gateway::run_gateway(config).await {
        log::error!("gateway failed: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_provider_mock() {
        let config = Cli::parse_from(["sms-mock"]).into_config();
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind, "0.0.0.0");
        assert_eq!(config.username, "");
        assert_eq!(config.password, "");
    }

    #[test]
    fn flags_fill_config() {
        let config = Cli::parse_from([
            "sms-mock",
            "--port",
            "9090",
            "--username",
            "alice",
            "--password",
            "secret",
            "--bind",
            "127.0.0.1",
        ])
        .into_config();
        assert_eq!(config.port, 9090);
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
        assert_eq!(config.username, "alice");
        assert_eq!(config.password, "secret");
    }

    #[test]
    fn unparsable_port_is_rejected() {
        assert!(Cli::try_parse_from(["sms-mock", "--port", "eighty"]).is_err());
        assert!(Cli::try_parse_from(["sms-mock", "--port", "70000"]).is_err());
    }
}
