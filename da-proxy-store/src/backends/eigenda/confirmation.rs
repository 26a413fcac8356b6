//! Waiting for a dispersed certificate to reach the required confirmation depth.
//!
//! The wait is a two state machine, `Waiting` and `Confirmed`, advanced once per tick of a
//! [`TickSource`]. Every tick asks the verifier about the certificate: success confirms it, a
//! [`VerifierError::ConfirmationDepthPending`] keeps waiting and any other error ends the wait.
//! Cancellation and the deadline are watched before every tick and while a verification is in
//! flight.

// std
use std::future::Future;
use std::time::Duration;
// crates
use da_proxy_core::da::{Certificate, CommitmentVerifier, VerifierError};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub trait TickSource: Send {
    /// Resolves on the next tick.
    fn tick(&mut self) -> impl Future<Output = ()> + Send;
}

/// Ticks every `period`, the first one a full period after creation.
pub struct IntervalTicks(Interval);

impl IntervalTicks {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self(interval)
    }
}

impl TickSource for IntervalTicks {
    async fn tick(&mut self) {
        self.0.tick().await;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConfirmationState {
    Waiting { attempts: u32 },
    Confirmed { attempts: u32 },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfirmationError {
    #[error("confirmation wait cancelled")]
    Cancelled,
    #[error("confirmation deadline reached after {attempts} attempts")]
    Timeout { attempts: u32 },
    #[error(transparent)]
    Rejected(VerifierError),
}

pub struct ConfirmationWait<'a, V: ?Sized, T> {
    verifier: &'a V,
    certificate: &'a Certificate,
    ticks: T,
    target_depth: u64,
    state: ConfirmationState,
}

impl<'a, V, T> ConfirmationWait<'a, V, T>
where
    V: CommitmentVerifier + ?Sized,
    T: TickSource,
{
    pub fn new(verifier: &'a V, certificate: &'a Certificate, ticks: T, target_depth: u64) -> Self {
        Self {
            verifier,
            certificate,
            ticks,
            target_depth,
            state: ConfirmationState::Waiting { attempts: 0 },
        }
    }

    pub fn state(&self) -> ConfirmationState {
        self.state
    }

    /// Apply the verifier answer for one tick.
    fn advance(&mut self, outcome: Result<(), VerifierError>) -> Result<(), ConfirmationError> {
        let ConfirmationState::Waiting { attempts } = self.state else {
            return Ok(());
        };
        let attempts = attempts + 1;
        match outcome {
            Ok(()) => {
                self.state = ConfirmationState::Confirmed { attempts };
                Ok(())
            }
            Err(e) if e.is_pending() => {
                info!(
                    target_depth = self.target_depth,
                    attempt = attempts,
                    cert = %self.certificate.log_key(),
                    "Blob confirmed, waiting for sufficient confirmation depth..."
                );
                self.state = ConfirmationState::Waiting { attempts };
                Ok(())
            }
            Err(e) => Err(ConfirmationError::Rejected(e)),
        }
    }

    /// Drive the machine until the certificate is confirmed, `deadline` passes or `cancel`
    /// fires. Returns the number of verification attempts it took.
    pub async fn run(
        mut self,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<u32, ConfirmationError> {
        let timeout = tokio::time::sleep_until(deadline);
        tokio::pin!(timeout);
        loop {
            let attempts = match self.state {
                ConfirmationState::Confirmed { .. } if cancel.is_cancelled() => {
                    return Err(ConfirmationError::Cancelled);
                }
                ConfirmationState::Confirmed { attempts } => {
                    debug!(attempts, cert = %self.certificate.log_key(), "DA certificate confirmed");
                    return Ok(attempts);
                }
                ConfirmationState::Waiting { attempts } => attempts,
            };
            // the timer resolution is a millisecond, an elapsed deadline must not let a ready
            // tick through
            if cancel.is_cancelled() {
                return Err(ConfirmationError::Cancelled);
            }
            if Instant::now() >= deadline {
                return Err(ConfirmationError::Timeout { attempts });
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ConfirmationError::Cancelled),
                _ = &mut timeout => return Err(ConfirmationError::Timeout { attempts }),
                _ = self.ticks.tick() => {
                    // an in-flight verification is bounded by the same deadline and token
                    let outcome = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(ConfirmationError::Cancelled),
                        _ = &mut timeout => return Err(ConfirmationError::Timeout { attempts }),
                        outcome = self.verifier.verify_certificate(self.certificate) => outcome,
                    };
                    self.advance(outcome)?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use da_proxy_core::da::{BatchReference, G1Commitment};
    use da_proxy_core::testutils::{Call, CallJournal, CertificateOutcome, MockVerifier};
    use tokio::sync::mpsc;

    /// Tick source fed by the test through a channel.
    struct ManualTicks(mpsc::UnboundedReceiver<()>);

    impl TickSource for ManualTicks {
        async fn tick(&mut self) {
            if self.0.recv().await.is_none() {
                std::future::pending::<()>().await;
            }
        }
    }

    fn manual_ticks(n: usize) -> (ManualTicks, mpsc::UnboundedSender<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        for _ in 0..n {
            sender.send(()).unwrap();
        }
        (ManualTicks(receiver), sender)
    }

    fn certificate() -> Certificate {
        Certificate {
            batch: BatchReference {
                batch_id: 7,
                batch_header_hash: [1; 32],
                confirmation_block_number: 100,
            },
            blob_index: 3,
            commitment: G1Commitment {
                x: [2; 32],
                y: [3; 32],
            },
            data_length: 4,
            inclusion_proof: vec![5; 8],
        }
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(3600)
    }

    #[tokio::test]
    async fn confirms_after_pending_ticks() {
        let journal = CallJournal::default();
        let verifier = MockVerifier::pending_then_confirmed(journal.clone(), 3);
        let certificate = certificate();
        let (ticks, _sender) = manual_ticks(4);

        let attempts = ConfirmationWait::new(&verifier, &certificate, ticks, 6)
            .run(far_deadline(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(attempts, 4);
        assert_eq!(journal.count(Call::VerifyCertificate), 4);
    }

    #[tokio::test]
    async fn fatal_error_stops_polling() {
        let journal = CallJournal::default();
        let verifier = MockVerifier::with_script(
            journal.clone(),
            [CertificateOutcome::Pending, CertificateOutcome::Rejected],
            CertificateOutcome::Confirmed,
        );
        let certificate = certificate();
        let (ticks, _sender) = manual_ticks(10);

        let result = ConfirmationWait::new(&verifier, &certificate, ticks, 6)
            .run(far_deadline(), &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(ConfirmationError::Rejected(VerifierError::Other(_)))
        ));
        assert_eq!(journal.count(Call::VerifyCertificate), 2);
    }

    #[tokio::test]
    async fn spent_deadline_times_out_without_polling() {
        let journal = CallJournal::default();
        let verifier = MockVerifier::new(journal.clone());
        let certificate = certificate();
        let (ticks, _sender) = manual_ticks(1);

        let result = ConfirmationWait::new(&verifier, &certificate, ticks, 6)
            .run(Instant::now(), &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(ConfirmationError::Timeout { attempts: 0 })
        ));
        assert_eq!(journal.count(Call::VerifyCertificate), 0);
    }

    #[tokio::test]
    async fn cancellation_is_not_a_timeout() {
        let journal = CallJournal::default();
        let verifier = MockVerifier::new(journal.clone());
        let certificate = certificate();
        let (ticks, _sender) = manual_ticks(1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = ConfirmationWait::new(&verifier, &certificate, ticks, 6)
            .run(far_deadline(), &cancel)
            .await;

        assert!(matches!(result, Err(ConfirmationError::Cancelled)));
        assert_eq!(journal.count(Call::VerifyCertificate), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_until_deadline_times_out() {
        let journal = CallJournal::default();
        let verifier = MockVerifier::with_script(
            journal.clone(),
            [],
            CertificateOutcome::Pending,
        );
        let certificate = certificate();
        let ticks = IntervalTicks::new(Duration::from_secs(12));

        let result = ConfirmationWait::new(&verifier, &certificate, ticks, 6)
            .run(Instant::now() + Duration::from_secs(50), &CancellationToken::new())
            .await;

        // ticks at 12, 24, 36 and 48 seconds
        assert!(matches!(
            result,
            Err(ConfirmationError::Timeout { attempts: 4 })
        ));
        assert_eq!(journal.count(Call::VerifyCertificate), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_first_tick_waits_a_full_period() {
        let start = Instant::now();
        let mut ticks = IntervalTicks::new(Duration::from_secs(12));
        ticks.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_verification_is_cut_at_the_deadline() {
        let journal = CallJournal::default();
        let verifier =
            MockVerifier::new(journal.clone()).with_latency(Duration::from_secs(600));
        let certificate = certificate();
        let ticks = IntervalTicks::new(Duration::from_secs(12));
        let start = Instant::now();

        let result = ConfirmationWait::new(&verifier, &certificate, ticks, 6)
            .run(start + Duration::from_secs(60), &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(ConfirmationError::Timeout { attempts: 0 })
        ));
        assert_eq!(start.elapsed(), Duration::from_secs(60));
        assert_eq!(journal.count(Call::VerifyCertificate), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_slow_verification() {
        let journal = CallJournal::default();
        let verifier =
            MockVerifier::new(journal.clone()).with_latency(Duration::from_secs(600));
        let certificate = certificate();
        let (ticks, _sender) = manual_ticks(1);
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let (result, ()) = tokio::join!(
            ConfirmationWait::new(&verifier, &certificate, ticks, 6).run(far_deadline(), &cancel),
            async {
                tokio::time::sleep(Duration::from_secs(20)).await;
                cancel.cancel();
            }
        );

        assert!(matches!(result, Err(ConfirmationError::Cancelled)));
        assert_eq!(start.elapsed(), Duration::from_secs(20));
        assert_eq!(journal.count(Call::VerifyCertificate), 1);
    }

    #[tokio::test]
    async fn confirmation_after_cancellation_is_not_reported() {
        let journal = CallJournal::default();
        let verifier = MockVerifier::new(journal);
        let certificate = certificate();
        let (ticks, _sender) = manual_ticks(0);
        let mut wait = ConfirmationWait::new(&verifier, &certificate, ticks, 6);
        wait.advance(Ok(())).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = wait.run(far_deadline(), &cancel).await;
        assert!(matches!(result, Err(ConfirmationError::Cancelled)));
    }

    #[test]
    fn advance_ignores_answers_once_confirmed() {
        let journal = CallJournal::default();
        let verifier = MockVerifier::new(journal);
        let certificate = certificate();
        let (ticks, _sender) = manual_ticks(0);
        let mut wait = ConfirmationWait::new(&verifier, &certificate, ticks, 6);

        wait.advance(Ok(())).unwrap();
        assert_eq!(wait.state(), ConfirmationState::Confirmed { attempts: 1 });
        wait.advance(Err(VerifierError::CommitmentMismatch)).unwrap();
        assert_eq!(wait.state(), ConfirmationState::Confirmed { attempts: 1 });
    }
}
