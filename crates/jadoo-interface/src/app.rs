//! Event loop
//!
//! One task owns the controller and serializes key input, timer completions
//! and the shutdown signal.

use std::future::Future;
use std::io;

use tokio::sync::mpsc;

use crate::controller::PresentationController;
use crate::input::KeyInput;
use crate::presentation::PresentationSink;
use crate::timers::TimerEvent;

/// Run until `Quit`, Ctrl+C, or the input source goes away.
pub async fn run<S: PresentationSink>(
    controller: PresentationController<S>,
    inputs: mpsc::Receiver<KeyInput>,
    timers: mpsc::UnboundedReceiver<TimerEvent>,
) -> PresentationController<S> {
    run_until(controller, inputs, timers, tokio::signal::ctrl_c()).await
}

/// Like [`run`], with `shutdown` standing in for Ctrl+C.
///
/// A failing `shutdown` ends the loop the same way a signal does.
async fn run_until<S, F>(
    mut controller: PresentationController<S>,
    mut inputs: mpsc::Receiver<KeyInput>,
    mut timers: mpsc::UnboundedReceiver<TimerEvent>,
    shutdown: F,
) -> PresentationController<S>
where
    S: PresentationSink,
    F: Future<Output = io::Result<()>>,
{
    controller.show_initial();

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            input = inputs.recv() => match input {
                Some(KeyInput::Quit) => {
                    tracing::info!("Quit requested");
                    break;
                }
                Some(input) => controller.handle_input(input),
                None => {
                    tracing::warn!("Input source closed");
                    break;
                }
            },
            Some(event) = timers.recv() => controller.handle_timer(event),
            result = &mut shutdown => {
                match result {
                    Ok(()) => tracing::info!("Interrupted"),
                    Err(e) => tracing::error!("Listening for Ctrl+C failed: {}", e),
                }
                break;
            }
        }
    }

    controller.shutdown();
    controller
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Mode;
    use crate::matcher::KeySequence;
    use crate::presentation::testing::{Effect, RecordingSink};
    use tokio::sync::oneshot;
    use crate::presentation::{Element, SoundCue};
    use crate::timers::Scheduler;
    use jadoo_config::{AmbientPolicy, Symbol};

    fn sym(c: char) -> Symbol {
        Symbol::new(c).unwrap()
    }

    fn setup() -> (
        PresentationController<RecordingSink>,
        mpsc::UnboundedReceiver<TimerEvent>,
    ) {
        let (scheduler, timers) = Scheduler::new();
        let sequence = KeySequence::new("BCFE".chars().map(sym).collect()).unwrap();
        let controller = PresentationController::new(
            RecordingSink::default(),
            sequence,
            AmbientPolicy::FollowMode,
            scheduler,
        );
        (controller, timers)
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_session_through_event_loop() {
        let (controller, timers) = setup();
        let (tx, rx) = mpsc::channel(16);
        let session = tokio::spawn(run(controller, rx, timers));

        tx.send(KeyInput::Activate).await.unwrap();
        for c in "BXCFE".chars() {
            tx.send(KeyInput::Symbol(sym(c))).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        }
        // Let the receiving window close
        tokio::time::sleep(std::time::Duration::from_secs(4)).await;
        tx.send(KeyInput::Quit).await.unwrap();

        let controller = session.await.unwrap();
        let sink = controller.sink();
        assert_eq!(controller.mode(), Mode::Inactive);
        assert_eq!(
            sink.sounds(),
            vec![
                SoundCue::Key(sym('B')),
                SoundCue::Key(sym('C')),
                SoundCue::Key(sym('F')),
                SoundCue::Key(sym('E')),
                SoundCue::Receiving,
            ]
        );
        assert!(sink.effects.contains(&Effect::Visible(Element::Receiving, false)));
        assert_eq!(sink.effects.last(), Some(&Effect::Visible(Element::EnterScreen, true)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_input_stops_loop() {
        let (controller, timers) = setup();
        let (tx, rx) = mpsc::channel(1);
        drop(tx);

        let controller = run(controller, rx, timers).await;
        assert_eq!(controller.mode(), Mode::Inactive);
        assert_eq!(controller.sink().visible(Element::EnterScreen), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_listener_failure_still_collapses_interface() {
        let (controller, timers) = setup();
        let (tx, rx) = mpsc::channel(4);
        let (signal_tx, signal_rx) = oneshot::channel::<io::Result<()>>();
        let shutdown = async move { signal_rx.await.unwrap_or(Ok(())) };
        let session = tokio::spawn(run_until(controller, rx, timers, shutdown));

        tx.send(KeyInput::Activate).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        signal_tx
            .send(Err(io::Error::new(io::ErrorKind::Other, "no signal handler")))
            .unwrap();

        let controller = session.await.unwrap();
        assert_eq!(controller.mode(), Mode::Inactive);
        assert!(controller.sink().effects.contains(&Effect::ReleaseFull));
        assert_eq!(controller.sink().visible(Element::EnterScreen), Some(true));
    }
}
