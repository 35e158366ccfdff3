use core::fmt;
use std::any::Any;

use tokio::sync::oneshot;

use crate::{actor_ref::WeakActorRef, mailbox::Mailbox};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisionStrategy {
    Restart,
    Resume,
    Stop,
}

pub trait Actor: Send + Sync + Sized + 'static {
    /// Called before the first message is handled (and again after every
    /// restart). `myself` can be handed to background work that reports back
    /// to the actor; it does not keep the actor alive.
    #[allow(unused_variables)]
    fn started(&mut self, myself: WeakActorRef<Self>) {}

    /// Called when a handler on the actor panics. The return value represents the
    /// supervision strategy used to handle the panic.
    /// NOTE: If this method panics, the actor can not recover from the panic.
    #[allow(unused_variables)]
    fn on_fail(&mut self, error: Box<dyn Any + Send>) -> SupervisionStrategy {
        SupervisionStrategy::Restart
    }
}

pub enum ActorError<A, M>
where
    A: Actor,
    M: Mailbox<A>,
{
    SendError(M::Error),
    ReceiveAnswerError(oneshot::error::RecvError),
}

impl<A, M> fmt::Debug for ActorError<A, M>
where
    A: Actor,
    M: Mailbox<A>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::SendError(why) => write!(f, "SendError: {:?}", why),
            Self::ReceiveAnswerError(why) => write!(f, "ReceiveError: {:?}", why),
        }
    }
}

impl<A, M> fmt::Display for ActorError<A, M>
where
    A: Actor,
    M: Mailbox<A>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::SendError(_) => write!(f, "actor mailbox is closed"),
            Self::ReceiveAnswerError(_) => {
                write!(f, "actor dropped the request without answering")
            }
        }
    }
}

impl<A, M> std::error::Error for ActorError<A, M>
where
    A: Actor,
    M: Mailbox<A>,
{
}
