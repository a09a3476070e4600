//! Receiver state machine: `LISTENING → ACCEPTED → HANDSHAKE_RECEIVED →
//! TRANSFERRING → (DONE | FAILED)`.

use std::path::Path;

use rbudp_core::{
    Bitmap, FLAG_BATCH_DONE, FLAG_SESSION_COMPLETE, PACKET_HEADER_SIZE, READY_ACK, RbudpError, TransmissionDescriptor,
    packet, path,
};
use rbudp_io::{ControlChannel, DataChannel, FileRegion, MmapFileRegion, OpenMode, StdControlChannel, StdDataChannel};

use crate::config::ReceiverConfig;

/// Drives a complete receiver session.
pub struct Receiver;

impl Receiver {
    /// Binds the data channel and accepts exactly one control-channel
    /// connection, then drives [`Receiver::run`] to completion.
    ///
    /// This is the `LISTENING`/`ACCEPTED` states: the only steps that talk to
    /// the operating system directly, so loopback tests can substitute
    /// [`Receiver::run`] with adversarial channel doubles instead.
    ///
    /// # Errors
    ///
    /// Returns [`RbudpError::Connect`] if binding or accepting fails, or any
    /// error [`Receiver::run`] returns.
    pub fn accept_and_run(config: &ReceiverConfig) -> Result<(), RbudpError> {
        let data = StdDataChannel::bind(config.port)?;
        let mut control = StdControlChannel::accept_one(&config.bind_host, config.port)?;
        Self::run(&mut control, &data)
    }

    /// Drives `HANDSHAKE_RECEIVED → TRANSFERRING` over an already-accepted
    /// control channel and an already-bound data channel.
    ///
    /// The destination file is opened here, once the handshake reveals its
    /// path and size — unlike the sender's source region, it cannot be
    /// opened by the caller ahead of time.
    ///
    /// # Errors
    ///
    /// Returns [`RbudpError`] on any control-channel I/O failure, a data
    /// packet with an out-of-range id (scenario S5), or a destination file
    /// that cannot be created, sized, or mapped.
    pub fn run<C, D>(control: &mut C, data: &D) -> Result<(), RbudpError>
    where
        C: ControlChannel,
        D: DataChannel,
    {
        let (descriptor, destination_path) = read_handshake(control)?;
        tracing::info!(
            number_packets = descriptor.number_packets,
            block_size = descriptor.block_size,
            destination_path = %destination_path,
            "receiver handshake accepted"
        );
        let result = run_inner(control, data, &descriptor, &destination_path);
        match &result {
            Ok(()) => tracing::info!("receiver session complete"),
            Err(error) => tracing::error!(stage = error.stage(), %error, "receiver session failed"),
        }
        result
    }
}

fn run_inner<C, D>(
    control: &mut C,
    data: &D,
    descriptor: &TransmissionDescriptor,
    destination_path: &str,
) -> Result<(), RbudpError>
where
    C: ControlChannel,
    D: DataChannel,
{
    let mut region = MmapFileRegion::open(
        Path::new(destination_path),
        descriptor.region_size(),
        OpenMode::ReadWrite,
        "open destination file",
    )?;
    control.send_all(&[READY_ACK], "handshake ack")?;

    transfer(control, data, descriptor, &mut region)?;

    region.flush()
}

fn read_handshake<C: ControlChannel>(control: &mut C) -> Result<(TransmissionDescriptor, String), RbudpError> {
    let mut number_packets_raw = [0u8; 4];
    control.recv_exact(&mut number_packets_raw, "handshake recv")?;
    let number_packets = u32::from_le_bytes(number_packets_raw);

    let mut block_size_raw = [0u8; 4];
    control.recv_exact(&mut block_size_raw, "handshake recv")?;
    let block_size = u32::from_le_bytes(block_size_raw);

    let mut path_field = [0u8; rbudp_core::PATH_FIELD_SIZE];
    control.recv_exact(&mut path_field, "handshake recv")?;

    let descriptor = TransmissionDescriptor::from_wire(number_packets, block_size)?;
    let destination_path = path::decode(&path_field)?;

    Ok((descriptor, destination_path))
}

fn transfer<C, D, F>(
    control: &mut C,
    data: &D,
    descriptor: &TransmissionDescriptor,
    region: &mut F,
) -> Result<(), RbudpError>
where
    C: ControlChannel,
    D: DataChannel,
    F: FileRegion,
{
    let mut bitmap = Bitmap::new(descriptor.number_packets);
    let mut packet_buf = vec![0u8; descriptor.packet_size as usize];

    loop {
        let mut flag = [0u8; 1];
        control.recv_exact(&mut flag, "round flag")?;

        match flag[0] {
            FLAG_SESSION_COMPLETE => return Ok(()),
            FLAG_BATCH_DONE => {
                drain_batch(data, descriptor, region, &mut bitmap, &mut packet_buf)?;
                tracing::debug!(all_set = bitmap.all_set(), "drained batch, replying with bitmap");
                control.send_all(bitmap.raw(), "bitmap send")?;
            }
            other => {
                return Err(RbudpError::ProtocolViolation {
                    stage: "round flag",
                    detail: format!("unexpected control flag byte {other:#04x}"),
                });
            }
        }
    }
}

fn drain_batch<D, F>(
    data: &D,
    descriptor: &TransmissionDescriptor,
    region: &mut F,
    bitmap: &mut Bitmap,
    packet_buf: &mut [u8],
) -> Result<(), RbudpError>
where
    D: DataChannel,
    F: FileRegion,
{
    while let Some(len) = data.try_recv(packet_buf, "data recv")? {
        if len < PACKET_HEADER_SIZE {
            return Err(RbudpError::ProtocolViolation {
                stage: "data recv",
                detail: format!("datagram of {len} bytes is shorter than the packet header"),
            });
        }

        let (id, payload) = packet::decode(&packet_buf[..len]);
        if id >= descriptor.number_packets {
            return Err(RbudpError::ProtocolViolation {
                stage: "data recv",
                detail: format!("packet id {id} is out of range for {} packets", descriptor.number_packets),
            });
        }

        let write_len = payload.len().min(descriptor.block_size as usize);
        region.write_at(descriptor.offset_of(id), &payload[..write_len])?;
        bitmap.set(id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::net::SocketAddr;

    struct MemoryFileRegion {
        bytes: Vec<u8>,
    }

    impl FileRegion for MemoryFileRegion {
        fn len(&self) -> u64 {
            self.bytes.len() as u64
        }

        fn read_at(&self, _offset: u64, _buf: &mut [u8]) -> Result<(), RbudpError> {
            unreachable!("receiver never reads its destination region")
        }

        fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<(), RbudpError> {
            let start = offset as usize;
            self.bytes[start..start + buf.len()].copy_from_slice(buf);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), RbudpError> {
            Ok(())
        }
    }

    struct ScriptedDataChannel {
        queued: RefCell<VecDeque<Vec<u8>>>,
    }

    impl DataChannel for ScriptedDataChannel {
        fn send_to(&self, _buf: &[u8], _addr: SocketAddr, _stage: &'static str) -> Result<(), RbudpError> {
            unreachable!("receiver never sends on the data channel")
        }

        fn try_recv(&self, buf: &mut [u8], _stage: &'static str) -> Result<Option<usize>, RbudpError> {
            match self.queued.borrow_mut().pop_front() {
                Some(datagram) => {
                    buf[..datagram.len()].copy_from_slice(&datagram);
                    Ok(Some(datagram.len()))
                }
                None => Ok(None),
            }
        }
    }

    #[test]
    fn out_of_range_packet_id_fails_the_session() {
        // S5: forged datagram with id == number_packets.
        let descriptor = TransmissionDescriptor::new(8, 4).unwrap();
        let mut forged = vec![0u8; descriptor.packet_size as usize];
        forged[0..4].copy_from_slice(&descriptor.number_packets.to_le_bytes());

        let data = ScriptedDataChannel {
            queued: RefCell::new(VecDeque::from([forged])),
        };
        let mut region = MemoryFileRegion {
            bytes: vec![0u8; descriptor.region_size() as usize],
        };
        let mut bitmap = Bitmap::new(descriptor.number_packets);
        let mut packet_buf = vec![0u8; descriptor.packet_size as usize];

        let result = drain_batch(&data, &descriptor, &mut region, &mut bitmap, &mut packet_buf);
        assert!(matches!(result, Err(RbudpError::ProtocolViolation { .. })));
    }

    #[test]
    fn in_range_packets_are_written_and_tracked() {
        let descriptor = TransmissionDescriptor::new(8, 4).unwrap();
        let mut first = vec![0u8; descriptor.packet_size as usize];
        packet::encode(0, b"ABCD", &mut first);
        let mut second = vec![0u8; descriptor.packet_size as usize];
        packet::encode(1, b"EFGH", &mut second);

        let data = ScriptedDataChannel {
            queued: RefCell::new(VecDeque::from([first, second])),
        };
        let mut region = MemoryFileRegion {
            bytes: vec![0u8; descriptor.region_size() as usize],
        };
        let mut bitmap = Bitmap::new(descriptor.number_packets);
        let mut packet_buf = vec![0u8; descriptor.packet_size as usize];

        drain_batch(&data, &descriptor, &mut region, &mut bitmap, &mut packet_buf).unwrap();

        assert_eq!(&region.bytes[0..8], b"ABCDEFGH");
        assert!(bitmap.test(0).unwrap());
        assert!(bitmap.test(1).unwrap());
        assert!(!bitmap.test(2).unwrap());
    }

    #[test]
    fn duplicate_packets_are_idempotent() {
        let descriptor = TransmissionDescriptor::new(8, 4).unwrap();
        let mut packet_a = vec![0u8; descriptor.packet_size as usize];
        packet::encode(0, b"ABCD", &mut packet_a);

        let data = ScriptedDataChannel {
            queued: RefCell::new(VecDeque::from([packet_a.clone(), packet_a.clone(), packet_a])),
        };
        let mut region = MemoryFileRegion {
            bytes: vec![0u8; descriptor.region_size() as usize],
        };
        let mut bitmap = Bitmap::new(descriptor.number_packets);
        let mut packet_buf = vec![0u8; descriptor.packet_size as usize];

        drain_batch(&data, &descriptor, &mut region, &mut bitmap, &mut packet_buf).unwrap();

        assert_eq!(&region.bytes[0..4], b"ABCD");
    }

    #[test]
    fn session_complete_flag_ends_the_transfer_loop() {
        struct OneShotControlChannel {
            flags: RefCell<VecDeque<u8>>,
        }

        impl ControlChannel for OneShotControlChannel {
            fn recv_exact(&mut self, buf: &mut [u8], _stage: &'static str) -> Result<(), RbudpError> {
                buf[0] = self.flags.borrow_mut().pop_front().expect("no scripted flag queued");
                Ok(())
            }

            fn send_all(&mut self, _buf: &[u8], _stage: &'static str) -> Result<(), RbudpError> {
                Ok(())
            }

            fn set_read_timeout(
                &mut self,
                _timeout: Option<std::time::Duration>,
                _stage: &'static str,
            ) -> Result<(), RbudpError> {
                Ok(())
            }
        }

        let descriptor = TransmissionDescriptor::new(8, 4).unwrap();
        let mut control = OneShotControlChannel {
            flags: RefCell::new(VecDeque::from([FLAG_SESSION_COMPLETE])),
        };
        let data = ScriptedDataChannel {
            queued: RefCell::new(VecDeque::new()),
        };
        let mut region = MemoryFileRegion {
            bytes: vec![0u8; descriptor.region_size() as usize],
        };

        transfer(&mut control, &data, &descriptor, &mut region).unwrap();
    }
}
