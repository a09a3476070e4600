//! Sender state machine: `CONNECTING → HANDSHAKE_SENT → BLASTING → DRAINING
//! → (DONE | FAILED)`.

use std::net::SocketAddr;

use rbudp_core::{
    Bitmap, FLAG_BATCH_DONE, FLAG_SESSION_COMPLETE, READY_ACK, RbudpError, TransmissionDescriptor, packet, path,
};
use rbudp_io::{ControlChannel, DataChannel, FileRegion, MmapFileRegion, OpenMode, StdControlChannel, StdDataChannel};

use crate::config::SenderConfig;

/// Drives a complete sender session.
pub struct Sender;

impl Sender {
    /// Resolves and connects real control/data sockets and opens the source
    /// file, then drives [`Sender::run`] to completion.
    ///
    /// This is the `CONNECTING` state: it is the only step that talks to the
    /// operating system directly, so loopback tests can substitute
    /// [`Sender::run`] with in-memory or adversarial channel doubles instead.
    ///
    /// # Errors
    ///
    /// Returns [`RbudpError::Connect`] if resolution, connection, or socket
    /// creation fails, or any error [`Sender::run`] returns.
    pub fn connect_and_run(config: &SenderConfig) -> Result<(), RbudpError> {
        let mut control = StdControlChannel::connect(&config.host, config.port)?;
        let data = StdDataChannel::unbound()?;
        let peer_addr = StdDataChannel::resolve(&config.host, config.port)?;
        let source = MmapFileRegion::open(
            &config.source_path,
            file_len(&config.source_path)?,
            OpenMode::ReadOnly,
            "open source file",
        )?;

        Self::run(config, &mut control, &data, peer_addr, &source)
    }

    /// Drives `HANDSHAKE_SENT → BLASTING → DRAINING` over already-constructed
    /// channels and an already-opened source region.
    ///
    /// `source.len()` is taken as the file's byte length for the purposes of
    /// [`TransmissionDescriptor::new`].
    ///
    /// # Errors
    ///
    /// Returns [`RbudpError`] on any control-channel I/O failure, data-channel
    /// send failure, or protocol violation (e.g. an unexpected handshake
    /// acknowledgement byte).
    pub fn run<C, D, F>(
        config: &SenderConfig,
        control: &mut C,
        data: &D,
        peer_addr: SocketAddr,
        source: &F,
    ) -> Result<(), RbudpError>
    where
        C: ControlChannel,
        D: DataChannel,
        F: FileRegion,
    {
        let file_size = source.len();
        let descriptor = TransmissionDescriptor::new(file_size, config.block_size)?;
        tracing::info!(
            number_packets = descriptor.number_packets,
            block_size = descriptor.block_size,
            "sender handshake descriptor computed"
        );

        let result = run_inner(config, control, data, peer_addr, source, &descriptor, file_size);

        match &result {
            Ok(()) => tracing::info!("sender session complete"),
            Err(error) => tracing::error!(stage = error.stage(), %error, "sender session failed"),
        }
        result
    }
}

#[allow(clippy::too_many_arguments)]
fn run_inner<C, D, F>(
    config: &SenderConfig,
    control: &mut C,
    data: &D,
    peer_addr: SocketAddr,
    source: &F,
    descriptor: &TransmissionDescriptor,
    file_size: u64,
) -> Result<(), RbudpError>
where
    C: ControlChannel,
    D: DataChannel,
    F: FileRegion,
{
    handshake(control, descriptor, &config.destination_path)?;
    blast(control, data, peer_addr, descriptor, source, file_size)?;
    control.send_all(&[FLAG_SESSION_COMPLETE], "terminate")
}

fn file_len(path: &std::path::Path) -> Result<u64, RbudpError> {
    std::fs::metadata(path)
        .map(|metadata| metadata.len())
        .map_err(|source| RbudpError::ResourceAcquisition {
            stage: "open source file",
            source,
        })
}

fn handshake<C: ControlChannel>(
    control: &mut C,
    descriptor: &TransmissionDescriptor,
    destination_path: &str,
) -> Result<(), RbudpError> {
    control.send_all(&descriptor.number_packets.to_le_bytes(), "handshake send")?;
    control.send_all(&descriptor.block_size.to_le_bytes(), "handshake send")?;
    control.send_all(&path::encode(destination_path)?, "handshake send")?;

    let mut ack = [0u8; 1];
    control.recv_exact(&mut ack, "handshake ack")?;
    if ack[0] != READY_ACK {
        return Err(RbudpError::ProtocolViolation {
            stage: "handshake ack",
            detail: format!("expected ready ack {READY_ACK:#04x}, got {:#04x}", ack[0]),
        });
    }
    Ok(())
}

fn blast<C, D, F>(
    control: &mut C,
    data: &D,
    peer_addr: SocketAddr,
    descriptor: &TransmissionDescriptor,
    source: &F,
    file_size: u64,
) -> Result<(), RbudpError>
where
    C: ControlChannel,
    D: DataChannel,
    F: FileRegion,
{
    let mut ack_bitmap = Bitmap::new(descriptor.number_packets);
    let mut packet_buf = vec![0u8; descriptor.packet_size as usize];
    let mut block_buf = vec![0u8; descriptor.block_size as usize];

    loop {
        let mut emitted = 0u32;
        for id in 0..descriptor.number_packets {
            if emitted >= descriptor.max_packets_per_batch {
                break;
            }
            if ack_bitmap.test(id)? {
                continue;
            }

            read_block(source, descriptor.offset_of(id), file_size, &mut block_buf)?;
            packet::encode(id, &block_buf, &mut packet_buf);
            data.send_to(&packet_buf, peer_addr, "data send")?;
            emitted += 1;
        }

        control.send_all(&[FLAG_BATCH_DONE], "batch flag")?;
        tracing::debug!(emitted, "batch sent, awaiting feedback bitmap");

        let mut recv_raw = vec![0u8; descriptor.bitmap_size_bytes as usize];
        control.recv_exact(&mut recv_raw, "bitmap recv")?;
        ack_bitmap.merge_from(&Bitmap::from_raw(descriptor.number_packets, &recv_raw));

        if ack_bitmap.all_set() {
            return Ok(());
        }
    }
}

/// Copies `buf.len()` bytes of the source file starting at `offset` into
/// `buf`, zero-padding any portion past `file_size` (the final, possibly
/// partial, block).
fn read_block<F: FileRegion>(source: &F, offset: u64, file_size: u64, buf: &mut [u8]) -> Result<(), RbudpError> {
    let available = file_size.saturating_sub(offset).min(buf.len() as u64) as usize;
    if available > 0 {
        source.read_at(offset, &mut buf[..available])?;
    }
    buf[available..].fill(0);
    Ok(())
}
