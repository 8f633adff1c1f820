//! Server wiring and lifecycle

mod router;

pub use router::{AppState, create_router};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::auth::{BearerVerifier, JwtVerifier};
use crate::aws::load_sdk_config;
use crate::config::{Config, KeyBackend, SecretBackend};
use crate::key::{KeyProvider, KmsKeyProvider, PemFileKeyProvider};
use crate::secret::{AwsSecretStore, InMemorySecretStore};
use crate::token::{RetrieveToken, SaveToken, TokenRetriever, TokenSaver};
use crate::{Error, Result};

/// token-vault HTTP server
pub struct Server {
    config: Config,
    state: Arc<AppState>,
    verifier: Arc<dyn BearerVerifier>,
}

impl Server {
    /// Construct every collaborator from configuration.
    ///
    /// Fetches the verification key once; failure aborts startup.
    pub async fn new(config: Config) -> Result<Self> {
        let sdk_config = if config.needs_aws() {
            Some(load_sdk_config(&config.aws).await)
        } else {
            None
        };

        let provider: Box<dyn KeyProvider> = match (config.key.backend, &sdk_config) {
            (KeyBackend::Kms, Some(sdk)) => {
                let provider = KmsKeyProvider::new(sdk, &config.key.key_id);
                info!(key_id = %provider.key_id(), "Fetching verification key from KMS");
                Box::new(provider)
            }
            (KeyBackend::File, _) => {
                let path = config.key.public_key_file.clone().ok_or_else(|| {
                    Error::Config("key.public_key_file is not set".to_string())
                })?;
                let provider = PemFileKeyProvider::new(path);
                info!(path = %provider.path().display(), "Reading verification key from file");
                Box::new(provider)
            }
            (KeyBackend::Kms, None) => {
                return Err(Error::Internal("AWS configuration was not loaded".to_string()));
            }
        };

        let verifier = JwtVerifier::from_provider(provider.as_ref(), &config.auth).await?;
        info!(backend = ?config.key.backend, "Verification key loaded");

        let root_domain = config.secrets.root_domain.clone();
        let (saver, retriever): (Arc<dyn SaveToken>, Arc<dyn RetrieveToken>) =
            match (config.secrets.backend, &sdk_config) {
                (SecretBackend::Aws, Some(sdk)) => {
                    let store = Arc::new(AwsSecretStore::new(sdk));
                    (
                        Arc::new(TokenSaver::from_store(root_domain.clone(), store.clone())),
                        Arc::new(TokenRetriever::from_store(root_domain, store)),
                    )
                }
                (SecretBackend::Memory, _) => {
                    warn!("Using in-memory secret store; tokens are lost on restart");
                    let store = Arc::new(InMemorySecretStore::new());
                    (
                        Arc::new(TokenSaver::from_store(root_domain.clone(), store.clone())),
                        Arc::new(TokenRetriever::from_store(root_domain, store)),
                    )
                }
                (SecretBackend::Aws, None) => {
                    return Err(Error::Internal("AWS configuration was not loaded".to_string()));
                }
            };
        info!(backend = ?config.secrets.backend, "Secret store ready");

        Ok(Self {
            config,
            state: Arc::new(AppState { saver, retriever }),
            verifier: Arc::new(verifier),
        })
    }

    /// Serve until Ctrl-C or SIGTERM.
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let app = create_router(self.state, self.verifier, self.config.server.max_body_size);
        let listener = TcpListener::bind(addr).await?;

        info!(version = env!("CARGO_PKG_VERSION"), host = %self.config.server.host, port = self.config.server.port, "Listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        info!("Server stopped");
        Ok(())
    }
}

/// Resolves on the first shutdown signal.
///
/// A signal handler that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
