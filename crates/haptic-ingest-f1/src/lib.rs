//! F1 UDP telemetry decoding (24-byte header, packet format 2021).
//!
//! Only two packet kinds matter to the haptic bridge: motion (0), which
//! carries g-forces, wheel slip and suspension data, and car telemetry (6),
//! which carries engine RPM. Everything else decodes to `Ok(None)`.

use anyhow::Context;
use byteorder::{LittleEndian, ReadBytesExt};
use haptic_ingest_core::*;
use model::{CarTelemetrySample, MotionSample, PhysicsFrame, WheelArray, WHEEL_COUNT};
use std::io::Cursor;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

pub const HEADER_SIZE: usize = 24;
pub const MAX_CARS: usize = 22;

// Packet IDs (Codemasters/EA spec). We only need Motion (0) and CarTelemetry (6).
pub const PACKET_MOTION: u8 = 0;
pub const PACKET_CAR_TELEMETRY: u8 = 6;

pub const CAR_MOTION_SIZE: usize = 60;
pub const CAR_TELEMETRY_SIZE: usize = 60;

// offsets inside one CarMotionData record
const G_FORCE_LATERAL_OFFSET: usize = 36;

// player-only motion block that follows the 22 car records
const MOTION_EXTRA_OFFSET: usize = HEADER_SIZE + MAX_CARS * CAR_MOTION_SIZE;
const SUSPENSION_ACCELERATION_OFFSET: usize = MOTION_EXTRA_OFFSET + 2 * 16;
const WHEEL_SLIP_OFFSET: usize = MOTION_EXTRA_OFFSET + 4 * 16;
pub const MOTION_PACKET_SIZE: usize = MOTION_EXTRA_OFFSET + 5 * 16 + 10 * 4;

// offsets inside one CarTelemetryData record
const ENGINE_RPM_OFFSET: usize = 16;
pub const CAR_TELEMETRY_PACKET_SIZE: usize = HEADER_SIZE + MAX_CARS * CAR_TELEMETRY_SIZE + 3;

#[derive(Clone, Debug)]
pub struct F1Config {
    pub bind_addr: String,       // e.g. "0.0.0.0:20777"
    pub expected_format: u16,    // header layout below is the 2021 one
}

impl Default for F1Config {
    fn default() -> Self {
        Self { bind_addr: "0.0.0.0:20777".into(), expected_format: 2021 }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("datagram of {len} bytes is shorter than the 24-byte header")]
    ShortHeader { len: usize },
    #[error("packet kind {kind} needs {expected} bytes, got {actual}")]
    ShortPayload { kind: u8, expected: usize, actual: usize },
    #[error("controlled car index {0} out of range")]
    CarIndex(u8),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacketHeader {
    pub packet_format: u16,
    pub game_major: u8,
    pub game_minor: u8,
    pub packet_version: u8,
    pub packet_id: u8,
    pub session_uid: u64,
    pub session_time: f32,
    pub frame_identifier: u32,
    pub player_car_index: u8,
    pub secondary_player_car_index: u8,
}

pub fn read_header(buf: &[u8]) -> Result<PacketHeader, DecodeError> {
    let short = || DecodeError::ShortHeader { len: buf.len() };
    let mut c = Cursor::new(buf);
    Ok(PacketHeader {
        packet_format: c.read_u16::<LittleEndian>().map_err(|_| short())?,
        game_major: c.read_u8().map_err(|_| short())?,
        game_minor: c.read_u8().map_err(|_| short())?,
        packet_version: c.read_u8().map_err(|_| short())?,
        packet_id: c.read_u8().map_err(|_| short())?,
        session_uid: c.read_u64::<LittleEndian>().map_err(|_| short())?,
        session_time: c.read_f32::<LittleEndian>().map_err(|_| short())?,
        frame_identifier: c.read_u32::<LittleEndian>().map_err(|_| short())?,
        player_car_index: c.read_u8().map_err(|_| short())?,
        secondary_player_car_index: c.read_u8().map_err(|_| short())?,
    })
}

/// Decodes one datagram. `Ok(None)` for packet kinds the bridge ignores,
/// `Err` when the datagram cannot be used.
pub fn decode_packet(buf: &[u8]) -> Result<Option<PhysicsFrame>, DecodeError> {
    let hdr = read_header(buf)?;
    let payload = match hdr.packet_id {
        PACKET_MOTION => model::FramePayload::Motion(read_motion(buf, &hdr)?),
        PACKET_CAR_TELEMETRY => model::FramePayload::CarTelemetry(read_car_telemetry(buf, &hdr)?),
        _ => return Ok(None),
    };
    Ok(Some(PhysicsFrame {
        session_uid: hdr.session_uid,
        session_time: hdr.session_time,
        frame_id: hdr.frame_identifier,
        payload,
    }))
}

fn check_packet(buf: &[u8], hdr: &PacketHeader, expected: usize) -> Result<usize, DecodeError> {
    let idx = hdr.player_car_index as usize;
    if idx >= MAX_CARS {
        return Err(DecodeError::CarIndex(hdr.player_car_index));
    }
    if buf.len() < expected {
        return Err(DecodeError::ShortPayload { kind: hdr.packet_id, expected, actual: buf.len() });
    }
    Ok(idx)
}

fn read_motion(buf: &[u8], hdr: &PacketHeader) -> Result<MotionSample, DecodeError> {
    let idx = check_packet(buf, hdr, MOTION_PACKET_SIZE)?;
    let car = HEADER_SIZE + idx * CAR_MOTION_SIZE;
    let short = |_: std::io::Error| DecodeError::ShortPayload {
        kind: hdr.packet_id,
        expected: MOTION_PACKET_SIZE,
        actual: buf.len(),
    };

    let mut c = Cursor::new(&buf[car + G_FORCE_LATERAL_OFFSET..]);
    let g_force_lateral = c.read_f32::<LittleEndian>().map_err(short)?;
    let g_force_longitudinal = c.read_f32::<LittleEndian>().map_err(short)?;

    Ok(MotionSample {
        g_force_lateral,
        g_force_longitudinal,
        suspension_acceleration: read_wheels(&buf[SUSPENSION_ACCELERATION_OFFSET..]).map_err(short)?,
        wheel_slip: read_wheels(&buf[WHEEL_SLIP_OFFSET..]).map_err(short)?,
    })
}

fn read_wheels(buf: &[u8]) -> std::io::Result<WheelArray> {
    let mut c = Cursor::new(buf);
    let mut out = [0.0; WHEEL_COUNT];
    for v in out.iter_mut() {
        *v = c.read_f32::<LittleEndian>()?;
    }
    Ok(out)
}

fn read_car_telemetry(buf: &[u8], hdr: &PacketHeader) -> Result<CarTelemetrySample, DecodeError> {
    let idx = check_packet(buf, hdr, CAR_TELEMETRY_PACKET_SIZE)?;
    let start = HEADER_SIZE + idx * CAR_TELEMETRY_SIZE + ENGINE_RPM_OFFSET;
    let engine_rpm = Cursor::new(&buf[start..])
        .read_u16::<LittleEndian>()
        .map_err(|_| DecodeError::ShortPayload {
            kind: hdr.packet_id,
            expected: CAR_TELEMETRY_PACKET_SIZE,
            actual: buf.len(),
        })?;
    Ok(CarTelemetrySample { engine_rpm })
}

pub struct F1Source {
    cfg: F1Config
}

impl F1Source {
    pub fn new(cfg: F1Config) -> Self { Self { cfg } }
}

#[async_trait::async_trait]
impl TelemetrySource for F1Source {
    async fn run(&self, sinks: StreamSinks) -> Result<(), IngestError> {
        let socket = UdpSocket::bind(&self.cfg.bind_addr).await
            .with_context(|| format!("bind {}", self.cfg.bind_addr))?;
        info!(addr = %self.cfg.bind_addr, "listening for F1 telemetry");
        let mut buf = vec![0u8; 2048];
        let mut format_reported = false;
        loop {
            let (len, peer) = match socket.recv_from(&mut buf).await {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e, "udp receive failed");
                    continue;
                }
            };
            let frame = match decode_packet(&buf[..len]) {
                Ok(Some(frame)) => frame,
                Ok(None) => continue,
                Err(e) => {
                    debug!(%peer, error = %e, "dropping datagram");
                    continue;
                }
            };
            if !format_reported {
                // other formats still decode; report the mismatch once
                if let Ok(hdr) = read_header(&buf[..len]) {
                    if hdr.packet_format != self.cfg.expected_format {
                        warn!(got = hdr.packet_format, expected = self.cfg.expected_format, "unexpected packet format");
                    }
                }
                format_reported = true;
            }
            if sinks.send(frame) == Delivery::Closed {
                info!("stream closed, stopping F1 source");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    fn header(packet_id: u8, car: u8) -> Vec<u8> {
        let mut b = Vec::with_capacity(HEADER_SIZE);
        b.put_u16_le(2021);
        b.put_u8(1);
        b.put_u8(3);
        b.put_u8(1);
        b.put_u8(packet_id);
        b.put_u64_le(0xDEAD_BEEF);
        b.put_f32_le(12.5);
        b.put_u32_le(42);
        b.put_u8(car);
        b.put_u8(255);
        b
    }

    fn put_f32_at(buf: &mut [u8], offset: usize, v: f32) {
        buf[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
    }

    #[test]
    fn layout_sizes() {
        assert_eq!(header(0, 0).len(), HEADER_SIZE);
        assert_eq!(MOTION_PACKET_SIZE, 1464);
        assert_eq!(CAR_TELEMETRY_PACKET_SIZE, 1347);
    }

    #[test]
    fn header_fields() {
        let hdr = read_header(&header(6, 3)).unwrap();
        assert_eq!(hdr.packet_format, 2021);
        assert_eq!(hdr.packet_id, 6);
        assert_eq!(hdr.session_uid, 0xDEAD_BEEF);
        assert_eq!(hdr.frame_identifier, 42);
        assert_eq!(hdr.player_car_index, 3);
    }

    #[test]
    fn motion_reads_player_car() {
        let mut buf = header(PACKET_MOTION, 2);
        buf.resize(MOTION_PACKET_SIZE, 0);
        let car = HEADER_SIZE + 2 * CAR_MOTION_SIZE;
        put_f32_at(&mut buf, car + 36, 0.2);
        put_f32_at(&mut buf, car + 40, -1.5);
        put_f32_at(&mut buf, SUSPENSION_ACCELERATION_OFFSET + 4, 7000.0);
        put_f32_at(&mut buf, WHEEL_SLIP_OFFSET, 0.15);

        let frame = decode_packet(&buf).unwrap().unwrap();
        assert_eq!(frame.frame_id, 42);
        let model::FramePayload::Motion(m) = frame.payload else { panic!("expected motion") };
        assert_eq!(m.g_force_lateral, 0.2);
        assert_eq!(m.g_force_longitudinal, -1.5);
        assert_eq!(m.suspension_acceleration, [0.0, 7000.0, 0.0, 0.0]);
        assert_eq!(m.wheel_slip, [0.15, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn telemetry_reads_engine_rpm() {
        let mut buf = header(PACKET_CAR_TELEMETRY, 1);
        buf.resize(CAR_TELEMETRY_PACKET_SIZE, 0);
        let at = HEADER_SIZE + CAR_TELEMETRY_SIZE + 16;
        buf[at..at + 2].copy_from_slice(&10500u16.to_le_bytes());

        let frame = decode_packet(&buf).unwrap().unwrap();
        assert_eq!(frame.payload, model::FramePayload::CarTelemetry(CarTelemetrySample { engine_rpm: 10500 }));
    }

    #[test]
    fn other_kinds_are_ignored() {
        let mut buf = header(2, 0);
        buf.resize(1200, 0);
        assert_eq!(decode_packet(&buf), Ok(None));
    }

    #[test]
    fn unusable_datagrams_are_errors() {
        assert_eq!(decode_packet(&[0u8; 10]), Err(DecodeError::ShortHeader { len: 10 }));

        let buf = header(PACKET_MOTION, 0);
        assert_eq!(
            decode_packet(&buf),
            Err(DecodeError::ShortPayload { kind: 0, expected: MOTION_PACKET_SIZE, actual: HEADER_SIZE })
        );

        let mut buf = header(PACKET_CAR_TELEMETRY, 22);
        buf.resize(CAR_TELEMETRY_PACKET_SIZE, 0);
        assert_eq!(decode_packet(&buf), Err(DecodeError::CarIndex(22)));
    }
}
