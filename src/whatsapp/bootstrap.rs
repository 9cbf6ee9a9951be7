//! Wires the shell's services through an [`ApplicationBuilder`].

use std::sync::Arc;

use super::app::App;
use super::client::WaClient;
use super::error::WaResult;
use super::services;
use super::socket::{Socket, SocketNotifier};
use crate::builder::ApplicationBuilder;
use crate::config::{AppConfig, ConfigProvider};
use crate::error::DiError;
use crate::registry::ServiceRegistry;
use crate::traits::Resolver;

/// Builds the root registry of the application.
///
/// Registers the configuration, the client, the notifier, the socket and the
/// app, then connects the socket in an asynchronous step. The socket and the
/// app are singletons; the app's message handler is subscribed as soon as
/// the app is first resolved.
pub async fn build_application(config: AppConfig, client: Arc<dyn WaClient>) -> WaResult<ServiceRegistry> {
    config.validate()?;

    let mut builder = ApplicationBuilder::new();
    builder.configure(move |registry| {
        registry
            .register_instance(services::CONFIG, config)
            .register_instance(services::CLIENT, client)
            .register_instance(services::NOTIFIER, SocketNotifier::new());
    });

    builder.configure(|registry| {
        registry
            .try_register_singleton_factory(services::SOCKET, |ctx| {
                let client = ctx.resolve_required::<Arc<dyn WaClient>>(services::CLIENT)?;
                let config = ctx.resolve_required::<AppConfig>(services::CONFIG)?;
                let notifier = ctx.resolve_required::<SocketNotifier>(services::NOTIFIER)?;
                Ok::<_, DiError>(Socket::new((*client).clone(), config, notifier))
            })
            .try_register_singleton_factory(services::APP, |ctx| {
                let socket = ctx.resolve_required::<Socket>(services::SOCKET)?;
                Ok::<_, DiError>(App::new(socket))
            });
    });

    builder
        .configure_async(|registry| async move {
            let socket = registry.resolve_required::<Socket>(services::SOCKET)?;
            socket.connect().await
        })
        .await?;

    tracing::debug!(steps = builder.steps_applied(), "application wired");
    Ok(builder.build())
}

/// Reads [`AppConfig`] from `WA_*` environment variables and builds the
/// application.
pub async fn build_from_env(client: Arc<dyn WaClient>) -> WaResult<ServiceRegistry> {
    let config = AppConfig::from_provider(&ConfigProvider::from_env())?;
    build_application(config, client).await
}
