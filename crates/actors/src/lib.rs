use std::panic::AssertUnwindSafe;

use actor::{Actor, SupervisionStrategy};
use actor_ref::ActorRef;
use futures::FutureExt;
use mailbox::{bounded_mailbox, MailboxReceiver};

pub mod actor;
pub mod actor_ref;
pub mod handler;
pub mod mailbox;

pub const MAILBOX_CAPACITY: usize = 32;

/// Creates and runs an actor. If the actor panics, it is either restared, resumed
/// or stoped acording to the behavior specified by `Actor::on_fail()`.
pub fn run<A, F>(actor_factory: F) -> ActorRef<A>
where
    A: Actor,
    F: 'static + Send + Fn() -> A,
{
    let (tx, mut rx) = bounded_mailbox(MAILBOX_CAPACITY);
    let actor_ref = ActorRef::new(tx);
    let myself = actor_ref.downgrade();
    let mut actor = actor_factory();
    actor.started(myself.clone());

    // run actor
    tokio::spawn(async move {
        while let Some(mut message) = rx.recv().await {
            // handle message
            let result = AssertUnwindSafe(message.handle(&mut actor))
                .catch_unwind()
                .await;
            // handler paniced?
            if let Err(why) = result {
                log::error!("actor paniced: {:?}", why);
                match actor.on_fail(why) {
                    SupervisionStrategy::Restart => {
                        actor = actor_factory();
                        actor.started(myself.clone());
                    }
                    SupervisionStrategy::Resume => {}
                    SupervisionStrategy::Stop => {
                        break;
                    }
                };
            }
        }
        log::debug!("actor stopped");
    });

    actor_ref
}

/// Runs an already constructed actor. Without a factory there is nothing to
/// restart from, so `SupervisionStrategy::Restart` resumes with the current
/// state.
pub fn start<A: Actor>(mut actor: A) -> ActorRef<A> {
    let (tx, mut rx) = bounded_mailbox(MAILBOX_CAPACITY);
    let actor_ref = ActorRef::new(tx);
    actor.started(actor_ref.downgrade());

    // run actor
    tokio::spawn(async move {
        while let Some(mut message) = rx.recv().await {
            let result = AssertUnwindSafe(message.handle(&mut actor))
                .catch_unwind()
                .await;
            if let Err(why) = result {
                log::error!("actor paniced: {:?}", why);
                match actor.on_fail(why) {
                    SupervisionStrategy::Restart => {
                        log::warn!("actor can not be restarted, resuming instead");
                    }
                    SupervisionStrategy::Resume => {}
                    SupervisionStrategy::Stop => {
                        break;
                    }
                }
            }
        }
        log::debug!("actor stopped");
    });

    actor_ref
}

#[cfg(test)]
mod tests {
    use std::{any::Any, time::Duration};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        actor_ref::WeakActorRef,
        handler::{Handler, Message},
    };

    struct Increment {
        value: i64,
    }

    impl Message for Increment {
        type Response = ();
    }

    struct GetValue;

    impl Message for GetValue {
        type Response = i64;
    }

    struct Explode;

    impl Message for Explode {
        type Response = ();
    }

    struct Counter {
        count: i64,
        strategy: SupervisionStrategy,
        myself: Option<WeakActorRef<Counter>>,
    }

    impl Counter {
        fn new(strategy: SupervisionStrategy) -> Self {
            Self {
                count: 0,
                strategy,
                myself: None,
            }
        }
    }

    impl Actor for Counter {
        fn started(&mut self, myself: WeakActorRef<Self>) {
            self.myself = Some(myself);
        }

        fn on_fail(&mut self, _: Box<dyn Any + Send>) -> SupervisionStrategy {
            self.strategy
        }
    }

    #[async_trait]
    impl Handler<Increment> for Counter {
        async fn handle(&mut self, message: Increment) {
            self.count += message.value;
        }
    }

    #[async_trait]
    impl Handler<GetValue> for Counter {
        async fn handle(&mut self, _: GetValue) -> i64 {
            self.count
        }
    }

    #[async_trait]
    impl Handler<Explode> for Counter {
        async fn handle(&mut self, _: Explode) {
            panic!("boom");
        }
    }

    #[tokio::test]
    async fn messages_are_handled_in_order() {
        let counter = run(|| Counter::new(SupervisionStrategy::Restart));
        counter.tell(Increment { value: 1 }).await.unwrap();
        counter.tell(Increment { value: 5 }).await.unwrap();
        counter.tell(Increment { value: -2 }).await.unwrap();
        assert_eq!(counter.ask(GetValue).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn restart_resets_state() {
        let _ = env_logger::builder().is_test(true).try_init();
        let counter = run(|| Counter::new(SupervisionStrategy::Restart));
        counter.tell(Increment { value: 3 }).await.unwrap();
        assert!(counter.ask(Explode).await.is_err());
        assert_eq!(counter.ask(GetValue).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn started_actor_resumes_after_panic() {
        let counter = start(Counter::new(SupervisionStrategy::Restart));
        counter.tell(Increment { value: 3 }).await.unwrap();
        assert!(counter.ask(Explode).await.is_err());
        assert_eq!(counter.ask(GetValue).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn stop_closes_the_mailbox() {
        let counter = start(Counter::new(SupervisionStrategy::Stop));
        assert!(counter.ask(Explode).await.is_err());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(counter.is_closed());
        assert!(counter.ask(GetValue).await.is_err());
    }

    #[tokio::test]
    async fn weak_ref_does_not_keep_actor_alive() {
        let counter = start(Counter::new(SupervisionStrategy::Resume));
        let weak = counter.downgrade();
        let upgraded = weak.upgrade().unwrap();
        upgraded.tell(Increment { value: 2 }).await.unwrap();
        assert_eq!(counter.ask(GetValue).await.unwrap(), 2);

        drop(upgraded);
        drop(counter);
        assert!(weak.upgrade().is_none());
    }
}
