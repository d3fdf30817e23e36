//! Integration tests for the tally device layer
//!
//! These tests verify end-to-end behavior including:
//! - vMix session setup, tally decoding and reconnection over real TCP
//! - Roland polling and frame decoding over an in-memory serial link
//! - Device selector switching and activation lifecycles

use std::time::Duration;

use tally_device::{Device, DeviceSelector, RolandDevice, TallyConfig, VmixConfig, VmixDevice};
use tally_protocol::roland::POLL_REQUEST;
use tally_protocol::{CameraColor, CameraStatus, Protocol};
use tally_sim::VirtualSwitcher;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::timeout;

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    /// vMix config with a short retry/read budget for deterministic tests
    pub fn vmix_config(port: u16) -> VmixConfig {
        VmixConfig {
            host: "127.0.0.1".to_string(),
            port,
            connect_attempts: 3,
            connect_delay_ms: 10,
            read_slices: 25,
            read_slice_ms: 20,
        }
    }

    /// Selector config whose vMix section fails fast (nothing listens)
    pub fn unroutable_config() -> TallyConfig {
        let mut config = TallyConfig::default();
        config.vmix = vmix_config(1);
        config.vmix.connect_attempts = 1;
        config.vmix.connect_delay_ms = 1;
        config
    }

    /// Poll `handle_data` until a snapshot arrives or patience runs out
    pub async fn poll_for_update(device: &mut impl Device) -> Option<CameraStatus> {
        for _ in 0..10 {
            if let Some(snapshot) = device.handle_data().await {
                return Some(snapshot);
            }
        }
        None
    }
}

// ============================================================================
// vMix Device Tests
// ============================================================================

mod vmix_tests {
    use super::*;

    #[tokio::test]
    async fn subscribes_and_decodes_tally_updates() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 64];
            let n = sock.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"SUBSCRIBE TALLY\r\n");

            let mut switcher = VirtualSwitcher::new(Protocol::Vmix);
            switcher.set_tally(0, 1);
            let line = switcher.take_output().unwrap();
            sock.write_all(&line).await.unwrap();
            // The identical line again: must not produce a second update
            sock.write_all(&line).await.unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
        });

        let mut device = VmixDevice::new(helpers::vmix_config(port));
        device.init().await;
        assert!(device.is_connected());

        let snapshot = helpers::poll_for_update(&mut device).await.unwrap();
        assert_eq!(snapshot.get(0), Some(CameraColor::Program));
        assert_eq!(snapshot.get(1), Some(CameraColor::Preview));
        assert_eq!(snapshot.get(2), Some(CameraColor::Off));

        assert!(device.handle_data().await.is_none());

        server.await.unwrap();
    }

    #[tokio::test]
    async fn exhausted_connect_leaves_device_unconnected() {
        // Nothing listens on the configured port
        let mut config = helpers::vmix_config(1);
        config.connect_attempts = 2;
        config.connect_delay_ms = 5;

        let mut device = VmixDevice::new(config);
        device.init().await;
        assert!(!device.is_connected());
        assert!(device.handle_data().await.is_none());
    }

    #[tokio::test]
    async fn check_connection_repairs_dropped_session() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 64];
            let _ = sock.read(&mut buf).await.unwrap();
            drop(sock); // kill the first session

            // The repaired session subscribes again
            let (mut sock, _) = listener.accept().await.unwrap();
            let n = sock.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"SUBSCRIBE TALLY\r\n");
        });

        let mut device = VmixDevice::new(helpers::vmix_config(port));
        device.init().await;
        assert!(device.is_connected());

        // EOF surfaces on a poll and marks the device disconnected
        while device.is_connected() {
            let _ = device.handle_data().await;
        }

        device.check_connection().await;
        assert!(device.is_connected());
        server.await.unwrap();
    }
}

// ============================================================================
// Roland Device Tests
// ============================================================================

mod roland_tests {
    use super::*;

    const POLL_PERIOD: Duration = Duration::from_millis(25);

    fn duplex_device() -> (RolandDevice<tokio::io::ReadHalf<tokio::io::DuplexStream>>, tokio::io::DuplexStream) {
        let (device_io, test_io) = tokio::io::duplex(512);
        let (reader, writer) = tokio::io::split(device_io);
        (RolandDevice::with_io(reader, writer, POLL_PERIOD), test_io)
    }

    #[tokio::test]
    async fn emits_poll_request_and_decodes_response() {
        let (mut device, mut link) = duplex_device();
        device.init().await;

        // The armed poll task transmits the fixed request
        let mut request = [0u8; 7];
        timeout(Duration::from_millis(500), link.read_exact(&mut request))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(request, POLL_REQUEST);

        let mut switcher = VirtualSwitcher::new(Protocol::Roland);
        switcher.set_tally(0, 1);
        link.write_all(&switcher.take_output().unwrap()).await.unwrap();

        let snapshot = helpers::poll_for_update(&mut device).await.unwrap();
        assert_eq!(snapshot.encode(), vec![0x32, 0x31, 0x30, 0x30]);

        // The identical response is consumed without a second update
        switcher.emit_update();
        link.write_all(&switcher.take_output().unwrap()).await.unwrap();
        assert!(device.handle_data().await.is_none());
    }

    #[tokio::test]
    async fn preview_collision_and_recut() {
        let (mut device, mut link) = duplex_device();
        device.init().await;

        let mut switcher = VirtualSwitcher::new(Protocol::Roland);
        switcher.set_tally(2, 2);
        link.write_all(&switcher.take_output().unwrap()).await.unwrap();

        let snapshot = helpers::poll_for_update(&mut device).await.unwrap();
        assert_eq!(snapshot.get(2), Some(CameraColor::Preview));

        switcher.set_tally(3, 0);
        link.write_all(&switcher.take_output().unwrap()).await.unwrap();

        let snapshot = helpers::poll_for_update(&mut device).await.unwrap();
        assert_eq!(snapshot.get(3), Some(CameraColor::Program));
        assert_eq!(snapshot.get(0), Some(CameraColor::Preview));
        assert_eq!(snapshot.get(2), Some(CameraColor::Off));
    }

    #[tokio::test]
    async fn out_of_range_channel_rejects_frame() {
        let (mut device, mut link) = duplex_device();
        device.init().await;

        link.write_all(b"\x02QPL:9,1,0,0,0,0,0,0;\x06").await.unwrap();
        assert!(device.handle_data().await.is_none());

        // A valid frame afterwards still lands
        link.write_all(b"\x02QPL:1,0,0,0,0,0,0,0;\x06").await.unwrap();
        let snapshot = helpers::poll_for_update(&mut device).await.unwrap();
        assert_eq!(snapshot.get(1), Some(CameraColor::Program));
    }

    #[tokio::test]
    async fn garbage_between_frames_is_skipped() {
        let (mut device, mut link) = duplex_device();
        device.init().await;

        link.write_all(b"noise\x06\x02QPL:0,1,0,0,0,0,0,0;\x06").await.unwrap();
        let snapshot = helpers::poll_for_update(&mut device).await.unwrap();
        assert_eq!(snapshot.get(0), Some(CameraColor::Program));
    }

    #[tokio::test]
    async fn dropping_device_cancels_poll_task() {
        let (mut device, mut link) = duplex_device();
        device.init().await;

        let mut request = [0u8; 7];
        timeout(Duration::from_millis(500), link.read_exact(&mut request))
            .await
            .unwrap()
            .unwrap();

        drop(device);

        // Once the aborted task releases the write half, the link drains
        // to EOF instead of carrying further requests
        let eof = timeout(Duration::from_millis(500), async {
            let mut buf = [0u8; 64];
            loop {
                match link.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
        })
        .await;
        assert!(eof.is_ok());
    }
}

// ============================================================================
// Robustness Tests
// ============================================================================

mod robustness_tests {
    use proptest::prelude::*;
    use tally_device::VmixState;

    proptest! {
        #[test]
        fn vmix_state_never_panics_on_garbage(lines in prop::collection::vec(
            prop::collection::vec(any::<u8>(), 0..64), 0..8,
        )) {
            let mut state = VmixState::new();
            for line in &lines {
                let _ = state.apply_line(line);
            }
        }
    }
}

// ============================================================================
// Device Selector Tests
// ============================================================================

mod selector_tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tally_device::AtemClient;

    use super::*;

    #[tokio::test]
    async fn switching_initializes_each_activation() {
        static CONNECTS: AtomicU32 = AtomicU32::new(0);
        static SERVICES: AtomicU32 = AtomicU32::new(0);

        struct CountingAtem;
        impl AtemClient for CountingAtem {
            fn open(_host: &str) -> Self {
                CountingAtem
            }
            async fn connect(&mut self) {
                CONNECTS.fetch_add(1, Ordering::SeqCst);
            }
            async fn service(&mut self) {
                SERVICES.fetch_add(1, Ordering::SeqCst);
            }
            fn program_tally(&self, _channel: u8) -> bool {
                false
            }
            fn preview_tally(&self, _channel: u8) -> bool {
                false
            }
            fn is_timed_out(&self) -> bool {
                false
            }
        }

        let mut selector = DeviceSelector::<CountingAtem>::new(helpers::unroutable_config());

        selector.select(Protocol::Atem).await.unwrap();
        assert_eq!(CONNECTS.load(Ordering::SeqCst), 1);
        assert_eq!(selector.active_protocol(), Some(Protocol::Atem));

        selector.select(Protocol::Vmix).await.unwrap();
        if let Some(device) = selector.active() {
            // Driving the vMix device never touches the ATEM decode path
            let _ = device.handle_data().await;
        }
        assert_eq!(SERVICES.load(Ordering::SeqCst), 0);
        assert_eq!(selector.active_protocol(), Some(Protocol::Vmix));

        selector.select(Protocol::Atem).await.unwrap();
        assert_eq!(CONNECTS.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn same_kind_select_returns_live_instance() {
        static CONNECTS: AtomicU32 = AtomicU32::new(0);

        struct CountingAtem;
        impl AtemClient for CountingAtem {
            fn open(_host: &str) -> Self {
                CountingAtem
            }
            async fn connect(&mut self) {
                CONNECTS.fetch_add(1, Ordering::SeqCst);
            }
            async fn service(&mut self) {}
            fn program_tally(&self, _channel: u8) -> bool {
                false
            }
            fn preview_tally(&self, _channel: u8) -> bool {
                false
            }
            fn is_timed_out(&self) -> bool {
                false
            }
        }

        let mut selector = DeviceSelector::<CountingAtem>::new(helpers::unroutable_config());
        selector.select(Protocol::Atem).await.unwrap();
        selector.select(Protocol::Atem).await.unwrap();
        assert_eq!(CONNECTS.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_id_is_rejected_without_switching() {
        struct InertAtem;
        impl AtemClient for InertAtem {
            fn open(_host: &str) -> Self {
                InertAtem
            }
            async fn connect(&mut self) {}
            async fn service(&mut self) {}
            fn program_tally(&self, _channel: u8) -> bool {
                false
            }
            fn preview_tally(&self, _channel: u8) -> bool {
                false
            }
            fn is_timed_out(&self) -> bool {
                false
            }
        }

        let mut selector = DeviceSelector::<InertAtem>::new(helpers::unroutable_config());
        // The default startup device is the ATEM switcher
        selector.select_default().await.unwrap();
        assert_eq!(selector.active_protocol(), Some(Protocol::Atem));

        // Selecting it by id is a no-op on the live instance
        selector.select_id(0).await.unwrap();
        assert_eq!(selector.active_protocol(), Some(Protocol::Atem));

        let err = selector.select_id(7).await.unwrap_err();
        assert!(matches!(
            err,
            tally_device::DeviceError::UnsupportedDevice(7),
        ));
        assert_eq!(selector.active_protocol(), Some(Protocol::Atem));
    }
}
