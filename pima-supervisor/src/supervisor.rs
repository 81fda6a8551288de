// SPDX-License-Identifier: Apache-2.0

use std::ops::ControlFlow;
use std::sync::Arc;

use pima_protocol::{ArmMode, Partitions, ProtocolEngine, StatusRecord};
use pima_transport::TransportOpener;
use tokio::sync::{watch, Mutex, RwLock};

use crate::config::SupervisorConfig;
use crate::error::{StartError, Unavailable};

/// Owns the panel's transport exclusively and keeps a session alive.
///
/// Two locks guard everything: `command` serializes every interaction with
/// the transport (poll, login, arm, recovery) and is held for the full
/// duration of each round trip; `status` guards only the cached
/// [`StatusRecord`] and is never held across I/O. Subscribers (the MQTT
/// bridge, HTTP long-pollers) watch [`Supervisor::subscribe`] instead of
/// registering callbacks, since a `tokio::sync::watch` channel already gives
/// "last value plus change notification" for free.
///
/// Generic over `O: TransportOpener` so tests can drive the state machine
/// with an in-memory fake instead of a real [`pima_transport::TransportConfig`].
pub struct Supervisor<O: TransportOpener> {
    command: Mutex<ProtocolEngine<O::Transport>>,
    status: RwLock<StatusRecord>,
    status_tx: watch::Sender<StatusRecord>,
    opener: O,
    login_code: String,
    poll_interval: std::time::Duration,
}

impl<O: TransportOpener + 'static> Supervisor<O> {
    /// Opens the transport, performs the initial status-then-login dance
    /// until the panel reports a logged-in session, and returns a
    /// ready-to-poll supervisor.
    pub async fn start(config: SupervisorConfig<O>) -> Result<Arc<Self>, StartError> {
        tracing::info!("starting: opening transport");
        let transport = config.opener.open().await?;
        tracing::info!("connected");
        let mut engine = ProtocolEngine::new(transport, config.capacity);

        let mut status = engine.get_status().await?;
        while !status.logged_in {
            tracing::info!("not logged in, sending login code");
            status = engine.login(&config.login_code).await?;
        }
        tracing::info!("logged in");

        let (status_tx, _rx) = watch::channel(status.clone());
        Ok(Arc::new(Self {
            command: Mutex::new(engine),
            status: RwLock::new(status),
            status_tx,
            opener: config.opener,
            login_code: config.login_code,
            poll_interval: config.poll_interval,
        }))
    }

    /// The last published status, without touching the transport.
    pub async fn current_status(&self) -> StatusRecord {
        self.status.read().await.clone()
    }

    /// Subscribes to status changes. The receiver always yields the most
    /// recent published record first, then blocks on `changed()` for the
    /// next one.
    pub fn subscribe(&self) -> watch::Receiver<StatusRecord> {
        self.status_tx.subscribe()
    }

    /// Arms or disarms `partitions`, publishing the resulting status on
    /// success. On any protocol-level failure the transport is torn down
    /// and rebuilt under the same lock the caller's command held, and
    /// [`Unavailable`] is returned — callers should retry rather than
    /// inspect the underlying fault, since the supervisor alone decides
    /// retry and rebuild policy.
    pub async fn arm(&self, mode: ArmMode, partitions: &Partitions) -> Result<StatusRecord, Unavailable> {
        let mut command = self.command.lock().await;
        match command.arm(mode, partitions).await {
            Ok(status) => {
                drop(command);
                self.publish(status.clone()).await;
                Ok(status)
            }
            Err(err) => {
                tracing::error!(error = %err, "arm command failed, rebuilding transport");
                let rebuilt = self.rebuild(&mut command).await;
                drop(command);
                if !rebuilt {
                    tracing::error!("transport rebuild failed after arm, requesting restart");
                }
                Err(Unavailable)
            }
        }
    }

    /// Runs the background poll loop until an unrecoverable transport
    /// failure occurs. Intended to be `tokio::spawn`ed; its return signals
    /// the caller (typically `pima-server`'s `main`) to let the process exit
    /// for a clean restart.
    pub async fn run_poll_loop(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if self.poll_once().await.is_break() {
                return;
            }
        }
    }

    /// Runs a single poll iteration: status poll, re-login-until-success on
    /// a dropped session, rebuild-on-error. Factored out of
    /// [`Self::run_poll_loop`] so it can be driven directly from tests
    /// without waiting on the ticker.
    async fn poll_once(&self) -> ControlFlow<()> {
        let mut command = self.command.lock().await;
        match command.get_status().await {
            Ok(mut status) => {
                while !status.logged_in {
                    tracing::info!("degraded: session lost, re-logging in");
                    match command.login(&self.login_code).await {
                        Ok(relogged) => status = relogged,
                        Err(err) => {
                            tracing::error!(error = %err, "recovering: re-login failed, rebuilding transport");
                            if !self.rebuild(&mut command).await {
                                return ControlFlow::Break(());
                            }
                            status = StatusRecord::idle();
                            break;
                        }
                    }
                }
                drop(command);
                self.publish(status).await;
                ControlFlow::Continue(())
            }
            Err(err) => {
                tracing::error!(error = %err, "degraded: status poll failed, rebuilding transport");
                if self.rebuild(&mut command).await {
                    ControlFlow::Continue(())
                } else {
                    ControlFlow::Break(())
                }
            }
        }
    }

    /// Tears down and reopens the transport in place. Returns `false` if
    /// reopening itself fails, which the caller treats as unrecoverable.
    async fn rebuild(&self, command: &mut ProtocolEngine<O::Transport>) -> bool {
        tracing::info!("recovering: rebuilding transport");
        let capacity = command.capacity();
        // Replacing `*command` drops the old engine, which drops its
        // transport and releases the underlying fd (tokio-serial / TcpStream
        // close on drop).
        match self.opener.open().await {
            Ok(transport) => {
                *command = ProtocolEngine::new(transport, capacity);
                tracing::info!("logged in: transport rebuilt, will re-login on next poll");
                true
            }
            Err(err) => {
                tracing::error!(error = %err, "terminated: failed to rebuild transport");
                false
            }
        }
    }

    async fn publish(&self, status: StatusRecord) {
        let changed = {
            let mut cached = self.status.write().await;
            if *cached == status {
                false
            } else {
                *cached = status.clone();
                true
            }
        };
        if changed {
            tracing::info!("status changed, publishing");
            let _ = self.status_tx.send(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pima_protocol::ZoneCapacity;
    use pima_transport::{Transport, TransportError};
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::Mutex as AsyncMutex;

    /// In-memory fake transport backed by queued read chunks, mirroring the
    /// one `pima-protocol` uses to drive its engine tests without real I/O.
    struct FakeTransport {
        reads: VecDeque<Vec<u8>>,
    }

    impl Transport for FakeTransport {
        async fn read(&mut self, _n: usize) -> Result<Vec<u8>, TransportError> {
            self.reads
                .pop_front()
                .ok_or_else(|| TransportError::Io(std::io::Error::new(std::io::ErrorKind::Other, "exhausted")))
        }

        async fn write(&mut self, _buf: &[u8]) -> Result<(), TransportError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    /// Hands out pre-scripted [`FakeTransport`]s in order, one per
    /// `open()` call — the first simulates the initial connection, any
    /// further ones simulate a supervisor-driven rebuild.
    struct FakeOpener {
        transports: AsyncMutex<VecDeque<FakeTransport>>,
    }

    impl TransportOpener for FakeOpener {
        type Transport = FakeTransport;

        async fn open(&self) -> Result<FakeTransport, TransportError> {
            self.transports
                .lock()
                .await
                .pop_front()
                .ok_or_else(|| TransportError::Open("no more scripted transports".to_owned()))
        }
    }

    fn idle_frame() -> Vec<u8> {
        pima_frame::encode(0x0d, 0x05, 0x00, &[], &[]).expect("encode never fails for tiny payloads")
    }

    /// Builds a full SYSTEM/STATUS reply body directly (bypassing
    /// `pima_frame::encode`'s addr-length byte, since inbound status frames
    /// place the 3-byte address immediately after the channel byte with no
    /// length prefix — see `pima_protocol::status`'s own fixtures).
    fn full_status_frame(flags: u8) -> Vec<u8> {
        let mut payload = vec![0x0d, 0x05, 0x01]; // module, STATUS, SYSTEM
        payload.extend_from_slice(&[0x02, 0x00, 0x00]); // address
        payload.extend_from_slice(&[0u8; 4 * 12]); // zone bitmaps, HP32 stride
        payload.extend_from_slice(&[0u8; 16]); // partitions, all disarm
        payload.extend_from_slice(&[0u8; 6]); // discrete failures
        payload.extend_from_slice(&[0u8; 17]); // clustered failures
        payload.extend_from_slice(&[0u8; 4]); // id/account
        payload.push(flags);

        let length = payload.len() as u8;
        let mut frame = vec![length];
        frame.extend_from_slice(&payload);
        let crc = pima_frame::crc16(&frame);
        frame.extend_from_slice(&crc.to_be_bytes());
        frame
    }

    /// Splits a frame into the engine's two-phase read: the length byte
    /// alone, then everything else.
    fn as_reads(frame: &[u8]) -> Vec<Vec<u8>> {
        vec![frame[..1].to_vec(), frame[1..].to_vec()]
    }

    fn opener_with(transports: Vec<FakeTransport>) -> FakeOpener {
        FakeOpener {
            transports: AsyncMutex::new(transports.into()),
        }
    }

    fn transport_from_reads(reads: Vec<Vec<u8>>) -> FakeTransport {
        FakeTransport { reads: reads.into() }
    }

    fn config(opener: FakeOpener) -> SupervisorConfig<FakeOpener> {
        let mut cfg = SupervisorConfig::new(opener, ZoneCapacity::Hp32, "1234".to_owned());
        cfg.poll_interval = Duration::from_millis(1);
        cfg
    }

    #[tokio::test]
    async fn start_logs_in_when_initial_status_not_logged_in() {
        let idle = idle_frame();
        let logged_in = full_status_frame(0b01);

        let mut reads = as_reads(&idle); // initial get_status: not logged in
        reads.extend(as_reads(&idle)); // login's drain read
        reads.extend(as_reads(&logged_in)); // login's internal get_status

        let opener = opener_with(vec![transport_from_reads(reads)]);
        let supervisor = Supervisor::start(config(opener)).await.unwrap();

        assert!(supervisor.current_status().await.logged_in);
    }

    #[tokio::test]
    async fn start_fails_when_transport_cannot_be_opened() {
        let opener = opener_with(vec![]);
        let err = Supervisor::start(config(opener)).await.unwrap_err();
        assert!(matches!(err, StartError::Transport(_)));
    }

    #[tokio::test]
    async fn poll_once_relogs_in_after_session_drop() {
        let logged_in = full_status_frame(0b01);
        let mut initial_reads = as_reads(&logged_in);
        // poll_once's get_status sees a dropped session...
        initial_reads.extend(as_reads(&idle_frame()));
        // ...then re-login's drain + status round trip restores it.
        initial_reads.extend(as_reads(&idle_frame()));
        initial_reads.extend(as_reads(&logged_in));

        let opener = opener_with(vec![transport_from_reads(initial_reads)]);
        let supervisor = Supervisor::start(config(opener)).await.unwrap();
        assert!(supervisor.current_status().await.logged_in);

        let flow = supervisor.poll_once().await;
        assert!(flow.is_continue());
        assert!(supervisor.current_status().await.logged_in);
    }

    #[tokio::test]
    async fn e6_identical_polls_publish_exactly_once() {
        let logged_in = full_status_frame(0b01);
        let mut initial_reads = as_reads(&logged_in);
        initial_reads.extend(as_reads(&logged_in)); // one more identical poll

        let opener = opener_with(vec![transport_from_reads(initial_reads)]);
        let supervisor = Supervisor::start(config(opener)).await.unwrap();

        let mut rx = supervisor.subscribe();
        rx.mark_unchanged();

        let flow = supervisor.poll_once().await;
        assert!(flow.is_continue());
        // Byte-identical status: no new value should have been sent.
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn poll_once_rebuilds_transport_on_read_failure() {
        let logged_in = full_status_frame(0b01);
        let first = transport_from_reads(as_reads(&logged_in));
        let mut second_reads = as_reads(&logged_in);
        second_reads.extend(as_reads(&logged_in));
        let second = transport_from_reads(second_reads);

        let opener = opener_with(vec![first, second]);
        let supervisor = Supervisor::start(config(opener)).await.unwrap();

        // First transport is now exhausted (only the startup frame was
        // queued) — the next poll_once's read fails and triggers a rebuild
        // onto the second scripted transport.
        let flow = supervisor.poll_once().await;
        assert!(flow.is_continue());
        assert!(supervisor.current_status().await.logged_in);
    }

    #[tokio::test]
    async fn poll_once_breaks_when_rebuild_also_fails() {
        let logged_in = full_status_frame(0b01);
        let first = transport_from_reads(as_reads(&logged_in));

        let opener = opener_with(vec![first]); // nothing left for a rebuild
        let supervisor = Supervisor::start(config(opener)).await.unwrap();

        let flow = supervisor.poll_once().await;
        assert!(flow.is_break());
    }

    #[tokio::test]
    async fn e3_arm_publishes_resulting_status() {
        let logged_in = full_status_frame(0b01);
        let mut reads = as_reads(&logged_in); // startup
        reads.extend(as_reads(&logged_in)); // arm's drain read
        reads.extend(as_reads(&logged_in)); // arm's get_status

        let opener = opener_with(vec![transport_from_reads(reads)]);
        let supervisor = Supervisor::start(config(opener)).await.unwrap();

        let mut rx = supervisor.subscribe();
        rx.mark_unchanged();

        let partitions = Partitions::from([1u8]);
        let status = supervisor.arm(ArmMode::FullArm, &partitions).await.unwrap();
        assert!(status.logged_in);
        // Same byte-identical status as already cached: arm still runs the
        // command, but publish() only notifies subscribers on a real change.
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn arm_rebuilds_and_reports_unavailable_on_failure() {
        let logged_in = full_status_frame(0b01);
        let opener = opener_with(vec![transport_from_reads(as_reads(&logged_in))]); // nothing for a rebuild
        let supervisor = Supervisor::start(config(opener)).await.unwrap();

        let partitions = Partitions::from([1u8]);
        let err = supervisor.arm(ArmMode::Disarm, &partitions).await.unwrap_err();
        assert_eq!(err, Unavailable);
    }
}
