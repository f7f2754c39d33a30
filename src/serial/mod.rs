//! # Serial Communication Module
//!
//! Handles the RS-485/RS-232 link to the camera.
//!
//! This module handles:
//! - Opening the serial port 8N1 at the configured baud rate
//! - Writing one Pelco-D frame per control tick
//! - Bounding each write with a timeout; a write that cannot finish in time
//!   is fatal rather than left to stall the control loop

pub mod port_trait;

use std::time::Duration;

use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, trace};

use crate::error::{PtzBridgeError, Result};
use crate::pelco::decoder::describe_frame;
use crate::pelco::protocol::PelcoDFrame;
use port_trait::{SerialPortIO, TokioSerialPort};

/// Baud rate most Pelco-D cameras ship with
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Camera Serial Port Handler
///
/// Owns the port and the write timeout. Generic over [`SerialPortIO`] so the
/// control loop can be exercised against a mock port.
pub struct CameraSerial<P = TokioSerialPort> {
    /// Serial port handle
    port: P,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
    /// Upper bound for one write + flush
    write_timeout: Duration,
}

impl<P> std::fmt::Debug for CameraSerial<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSerial")
            .field("device_path", &self.device_path)
            .field("write_timeout", &self.write_timeout)
            .finish_non_exhaustive()
    }
}

impl CameraSerial<TokioSerialPort> {
    /// Open the serial port connected to the camera
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `path` - Device path (e.g., "/dev/ttyUSB0")
    /// * `baud_rate` - Line speed configured on the camera
    /// * `write_timeout` - Upper bound for sending one frame
    ///
    /// # Errors
    ///
    /// Returns `Serial` error if the port cannot be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use ptz_bridge::serial::CameraSerial;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let serial = CameraSerial::open("/dev/ttyUSB0", 9600, Duration::from_millis(100))?;
    ///     println!("Connected to: {}", serial.device_path());
    ///     Ok(())
    /// }
    /// ```
    pub fn open(path: &str, baud_rate: u32, write_timeout: Duration) -> Result<Self> {
        debug!("Opening serial port {} at {} baud", path, baud_rate);

        let port = Self::open_port(path, baud_rate)?;
        info!("Opened camera serial port at {} ({} baud, 8N1)", path, baud_rate);

        Ok(Self::with_port(TokioSerialPort::new(port), path, write_timeout))
    }

    /// Open a specific serial port with Pelco-D line settings (8N1, no flow control)
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| PtzBridgeError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }
}

impl<P: SerialPortIO> CameraSerial<P> {
    /// Wrap an already-open port
    pub fn with_port(port: P, device_path: impl Into<String>, write_timeout: Duration) -> Self {
        Self {
            port,
            device_path: device_path.into(),
            write_timeout,
        }
    }

    /// Send one Pelco-D frame to the camera
    ///
    /// Writes and flushes the frame; both must complete within the write
    /// timeout.
    ///
    /// # Errors
    ///
    /// - `Serial`: the write or flush failed
    /// - `SerialWriteTimeout`: the write did not complete in time
    pub async fn send_frame(&mut self, frame: &PelcoDFrame) -> Result<()> {
        let limit = self.write_timeout;
        let port = &mut self.port;

        let write = async move {
            port.write_all(frame.as_ref())
                .await
                .map_err(|e| PtzBridgeError::Serial(format!("Failed to write frame: {}", e)))?;
            port.flush()
                .await
                .map_err(|e| PtzBridgeError::Serial(format!("Failed to flush serial port: {}", e)))
        };

        match tokio::time::timeout(limit, write).await {
            Ok(result) => result?,
            Err(_) => return Err(PtzBridgeError::SerialWriteTimeout(limit.as_millis() as u64)),
        }

        debug!("Sent frame [{}]", frame);
        trace!("{}", describe_frame(frame.as_ref()));
        Ok(())
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::port_trait::mocks::MockSerialPort;
    use super::*;
    use crate::pelco::encoder::encode_movement;
    use crate::pelco::protocol::{MotionDecision, Pan, Tilt, Zoom};
    use std::io;

    fn mock_serial(timeout_ms: u64) -> (MockSerialPort, CameraSerial<MockSerialPort>) {
        let port = MockSerialPort::new();
        let serial = CameraSerial::with_port(
            port.clone(),
            "/dev/mock",
            Duration::from_millis(timeout_ms),
        );
        (port, serial)
    }

    fn pan_left_frame() -> PelcoDFrame {
        let decision = MotionDecision::new(Pan::Left, 0x1C, Tilt::Stop, 0, Zoom::Stop);
        encode_movement(1, &decision)
    }

    #[test]
    fn test_default_baud_rate() {
        assert_eq!(DEFAULT_BAUD_RATE, 9600);
    }

    #[test]
    fn test_open_port_with_invalid_path_returns_error() {
        let result = CameraSerial::open_port("/dev/nonexistent_serial_device_12345", 9600);

        match result {
            Err(PtzBridgeError::Serial(msg)) => {
                assert!(msg.contains("/dev/nonexistent_serial_device_12345"));
                assert!(msg.contains("Failed to open"));
            }
            Err(other) => panic!("Expected Serial error, got: {:?}", other),
            Ok(_) => panic!("Expected Serial error, port opened"),
        }
    }

    #[tokio::test]
    async fn test_send_frame_writes_exact_bytes() {
        let (port, mut serial) = mock_serial(100);

        serial.send_frame(&pan_left_frame()).await.unwrap();

        let written = port.get_written_data();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0], vec![0xFF, 0x01, 0x00, 0x04, 0x1C, 0x00, 0x21]);
    }

    #[tokio::test]
    async fn test_send_frame_write_error() {
        let (port, mut serial) = mock_serial(100);
        port.set_write_error(io::ErrorKind::BrokenPipe);

        let result = serial.send_frame(&pan_left_frame()).await;
        match result {
            Err(PtzBridgeError::Serial(msg)) => assert!(msg.contains("Failed to write frame")),
            other => panic!("Expected Serial error, got: {:?}", other),
        }
        assert!(port.get_written_data().is_empty());
    }

    #[tokio::test]
    async fn test_send_frame_flush_error() {
        let (port, mut serial) = mock_serial(100);
        port.set_flush_error(io::ErrorKind::Other);

        let result = serial.send_frame(&pan_left_frame()).await;
        match result {
            Err(PtzBridgeError::Serial(msg)) => assert!(msg.contains("flush")),
            other => panic!("Expected Serial error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_frame_timeout() {
        let (port, mut serial) = mock_serial(10);
        port.set_write_delay(Duration::from_millis(500));

        let result = serial.send_frame(&pan_left_frame()).await;
        assert!(matches!(result, Err(PtzBridgeError::SerialWriteTimeout(10))));
    }

    #[test]
    fn test_accessors() {
        let (_, serial) = mock_serial(250);
        assert_eq!(serial.device_path(), "/dev/mock");
        assert_eq!(serial.write_timeout(), Duration::from_millis(250));
    }

    // Integration test - only runs if camera hardware is connected
    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_send_frame_with_real_hardware() {
        let result = CameraSerial::open("/dev/ttyUSB0", DEFAULT_BAUD_RATE, Duration::from_millis(100));

        if let Ok(mut serial) = result {
            let send_result = serial.send_frame(&crate::pelco::encoder::encode_stop(1)).await;
            assert!(send_result.is_ok(), "Failed to send frame: {:?}", send_result);
        } else {
            println!("No camera serial adapter detected (skipping send test)");
        }
    }
}
