//! The rate-limited reading relay.
//!
//! For each command: check the requester's cooldown, then either reply with
//! the remaining wait, or announce the reading, trigger it on the gateway in
//! a background task and deliver the result (text, then image) when it
//! completes.

use crate::cooldown::{Admission, CooldownStore};
use crate::error::CommandError;
use crate::messages;
use crate::request::CommandRequest;
use relay_common::RequesterId;
use relay_config::Config;
use relay_gateway::{ActionGateway, ActionRequest, GatewayError, PERFORM_READING};
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, instrument, warn, Instrument};

/// Connection names and key layout used by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    /// Connection that sends chat messages.
    pub chat_connection: String,
    /// Connection that performs readings.
    pub reading_connection: String,
    /// Cooldown key prefix; the requester id is appended.
    pub key_prefix: String,
}

impl RelaySettings {
    /// Settings taken from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            chat_connection: config.gateway.chat_connection.clone(),
            reading_connection: config.gateway.reading_connection.clone(),
            key_prefix: config.cooldown.key_prefix.clone(),
        }
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// What the admission step decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The requester was told to wait.
    Throttled {
        /// Seconds left on the requester's cooldown.
        remaining_secs: u64,
    },
    /// The reading was announced and triggered in the background.
    ReadingStarted,
}

struct RelayInner {
    settings: RelaySettings,
    store: Arc<dyn CooldownStore>,
    gateway: Arc<dyn ActionGateway>,
    tasks: TaskTracker,
}

/// Relays reading commands to the action gateway behind a cooldown.
///
/// Cheap to clone; clones share the store, gateway and in-flight tasks.
#[derive(Clone)]
pub struct CommandRelay {
    inner: Arc<RelayInner>,
}

impl std::fmt::Debug for CommandRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRelay")
            .field("settings", &self.inner.settings)
            .field("in_flight", &self.inner.tasks.len())
            .finish_non_exhaustive()
    }
}

impl CommandRelay {
    /// Creates a relay over the given store and gateway.
    pub fn new(
        settings: RelaySettings,
        store: Arc<dyn CooldownStore>,
        gateway: Arc<dyn ActionGateway>,
    ) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                settings,
                store,
                gateway,
                tasks: TaskTracker::new(),
            }),
        }
    }

    /// Store key of a requester's cooldown record.
    pub fn cooldown_key(&self, requester: RequesterId) -> String {
        format!("{}{}", self.inner.settings.key_prefix, requester)
    }

    /// Handles a command in the background and logs how it ended.
    ///
    /// Returns immediately; use [`CommandRelay::drain`] to wait for the work.
    pub fn dispatch(&self, request: CommandRequest) {
        let relay = self.clone();
        self.inner.tasks.spawn(async move {
            let requester = request.requester;
            match relay.handle(request).await {
                Ok(outcome) => debug!(%requester, ?outcome, "Command handled"),
                Err(e) => log_failure(&e),
            }
        });
    }

    /// Runs admission and the start notification, then triggers the reading.
    ///
    /// Returns once the reading has been triggered in the background; the
    /// result notifications are sent by that background task.
    #[instrument(
        skip(self, request),
        fields(requester = %request.requester, target = %request.target(), group = request.is_group)
    )]
    pub async fn handle(&self, request: CommandRequest) -> Result<RelayOutcome, CommandError> {
        let key = self.cooldown_key(request.requester);

        if let Admission::Blocked { remaining_secs } = self.inner.store.try_acquire(&key).await? {
            info!(remaining_secs, "Requester is on cooldown");
            self.send_text(&request, messages::wait_message(&request, remaining_secs))
                .await?;
            return Ok(RelayOutcome::Throttled { remaining_secs });
        }

        self.send_text(&request, messages::start_message(&request))
            .await?;

        let relay = self.clone();
        self.inner.tasks.spawn(
            async move {
                if let Err(e) = relay.complete_reading(&request).await {
                    log_failure(&e);
                }
            }
            .in_current_span(),
        );

        Ok(RelayOutcome::ReadingStarted)
    }

    /// Performs the reading and delivers its text, then its image.
    async fn complete_reading(&self, request: &CommandRequest) -> Result<(), CommandError> {
        let settings = &self.inner.settings;
        let response = match self
            .inner
            .gateway
            .execute(&ActionRequest::perform_reading(&settings.reading_connection))
            .await
        {
            Ok(response) => response,
            // An HTTP error answer is a refusal, not a transport failure.
            Err(GatewayError::Status { status, .. }) => {
                return Err(CommandError::GatewayRejected {
                    action: PERFORM_READING.to_string(),
                    status: status.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        debug!(?response, "Reading response received");

        if !response.is_success() {
            return Err(CommandError::GatewayRejected {
                action: PERFORM_READING.to_string(),
                status: response.status,
            });
        }

        let reading = response.reading()?;
        info!(prompt = %reading.prompt, "Reading completed");

        self.send_text(request, messages::result_message(request, &reading.reading_long))
            .await?;
        self.execute(ActionRequest::send_message_with_image(
            &settings.chat_connection,
            request.target(),
            messages::image_caption(request),
            reading.image_url,
        ))
        .await
    }

    async fn send_text(&self, request: &CommandRequest, text: String) -> Result<(), CommandError> {
        self.execute(ActionRequest::send_message(
            &self.inner.settings.chat_connection,
            request.target(),
            text,
        ))
        .await
    }

    async fn execute(&self, action: ActionRequest) -> Result<(), CommandError> {
        let response = self.inner.gateway.execute(&action).await?;
        if !response.is_success() {
            // Delivery is best effort; a refused send does not stop the flow.
            warn!(
                action = %action.action,
                status = %response.status,
                "Gateway did not confirm delivery"
            );
        }
        Ok(())
    }

    /// Number of commands and readings still running.
    pub fn in_flight(&self) -> usize {
        self.inner.tasks.len()
    }

    /// Waits for every dispatched command and triggered reading to finish.
    ///
    /// Safe to call from several tasks at once. The tracker is left closed:
    /// closing only lets `wait` return once nothing is in flight, and work
    /// dispatched afterwards is still tracked by later drains.
    pub async fn drain(&self) {
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
    }
}

fn log_failure(error: &CommandError) {
    match error {
        CommandError::StoreUnavailable(e) => {
            error!("Cooldown check failed, command dropped: {}", e);
        }
        CommandError::GatewayUnreachable(e) => {
            error!(url = e.url(), "Error calling the action gateway: {}", e);
        }
        CommandError::GatewayRejected { action, status } => {
            error!(%action, %status, "Something went wrong performing the reading");
        }
        CommandError::MalformedReading(e) => {
            error!("Error processing reading result: {}", e);
        }
    }
}
