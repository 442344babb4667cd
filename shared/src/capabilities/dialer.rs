use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::EmergencyService;

/// Asks the platform to place a phone call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DialOperation {
    Call {
        service: EmergencyService,
        number: String,
    },
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DialError {
    #[error("telephony is not available on this device")]
    Unavailable,

    #[error("call permission denied")]
    PermissionDenied,

    #[error("dial failed: {message}")]
    Failed { message: String },
}

pub type DialResult = Result<(), DialError>;

impl Operation for DialOperation {
    type Output = DialResult;
}

pub struct Dialer<Ev> {
    context: CapabilityContext<DialOperation, Ev>,
}

impl<Ev> Capability<Ev> for Dialer<Ev> {
    type Operation = DialOperation;
    type MappedSelf<MappedEv> = Dialer<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + Copy + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Dialer::new(self.context.map_event(f))
    }
}

impl<Ev> Dialer<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<DialOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn call<F>(&self, service: EmergencyService, callback: F)
    where
        F: FnOnce(DialResult) -> Ev + Send + 'static,
    {
        let operation = DialOperation::Call {
            service,
            number: service.number().to_string(),
        };
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx.request_from_shell(operation).await;
            ctx.update_app(callback(result));
        });
    }
}
