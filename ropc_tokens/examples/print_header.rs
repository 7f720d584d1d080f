use std::{sync::Arc, time::Duration};

use clap::Parser;
use ropc_tokens::{
    ExpiryRule, Settings, TlsConfig, TokenLifetimeConfig, TokenProvider,
};

#[derive(Debug, Parser)]
struct Opts {
    /// Base URL of the identity endpoint
    #[arg(long, env, default_value = "https://login.microsoftonline.com/")]
    authentication_endpoint: String,

    /// The resource to request a token for
    #[arg(long, env, default_value = "https://management.core.windows.net/")]
    token_audience: String,

    /// The directory tenant
    #[arg(short, long, env)]
    tenant_id: String,

    /// The client ID of the application
    #[arg(short, long, env)]
    client_id: String,

    /// The resource owner's username
    #[arg(short, long, env)]
    username: String,

    /// The resource owner's password
    #[arg(short, long, env, hide_env_values = true)]
    password: String,

    /// Send the token request with POST instead of GET
    #[arg(long, env)]
    post: bool,

    /// Keep using a token for the threshold past its expiry instead of refreshing early
    #[arg(long, env)]
    grace_after_expiry: bool,

    /// Seconds around expiry at which the token is refreshed
    #[arg(long, env, default_value_t = 300)]
    threshold_secs: u64,

    /// Skip certificate validation of the identity endpoint
    #[arg(long, env)]
    accept_invalid_certs: bool,

    /// Keep printing the header every N seconds
    #[arg(long, env)]
    interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();

    let rule = if opts.grace_after_expiry {
        ExpiryRule::GraceAfterExpiry
    } else {
        ExpiryRule::RefreshEarly
    };

    let mut builder = TokenProvider::builder()
        .tenant_id(opts.tenant_id)
        .client_id(opts.client_id)
        .username(opts.username)
        .password(opts.password)
        .settings(Arc::new(Settings::new(
            opts.authentication_endpoint,
            opts.token_audience,
        )))
        .tls_config(TlsConfig::default().accept_invalid_certs(opts.accept_invalid_certs))
        .lifetime_config(TokenLifetimeConfig::new(
            Duration::from_secs(opts.threshold_secs),
            rule,
        ));

    if opts.post {
        builder = builder.using_post();
    }

    let provider = builder.build()?;

    println!("{}", provider.authentication_header().await?);

    if let Some(secs) = opts.interval_secs {
        let mut interval = tokio::time::interval(Duration::from_secs(secs));
        interval.tick().await;
        loop {
            interval.tick().await;
            match provider.authentication_header().await {
                Ok(header) => println!("{}", header),
                Err(error) => tracing::error!(
                    error = (&error as &dyn std::error::Error),
                    "unable to obtain authorization header"
                ),
            }
        }
    }

    Ok(())
}
