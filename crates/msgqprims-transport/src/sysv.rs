use std::io;
use std::sync::OnceLock;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::{Result, TransportError};
use crate::key::ChannelKey;
use crate::traits::{
    check_payload, check_type, decode_continuation, ChannelId, Frame, FrameTransport, OpenFlags,
    OpenMode, QueueStat, WaitMode, CONTINUATION_SIZE, FRAME_CAPACITY, LAST, MORE,
};

const TEXT_SIZE: usize = CONTINUATION_SIZE + FRAME_CAPACITY;

const MSGMAX_PATH: &str = "/proc/sys/kernel/msgmax";

/// Stock Linux value of `kernel.msgmax`.
const DEFAULT_MSGMAX: usize = 8192;

/// Largest host message (`msgsz`) the kernel accepts, read once per process.
fn host_msgmax() -> usize {
    static MSGMAX: OnceLock<usize> = OnceLock::new();
    *MSGMAX.get_or_init(|| {
        let msgmax = std::fs::read_to_string(MSGMAX_PATH)
            .ok()
            .and_then(|text| text.trim().parse().ok())
            .unwrap_or(DEFAULT_MSGMAX);
        debug!(msgmax, "host message size limit");
        msgmax
    })
}

/// Payload bytes that fit in one host message of at most `msgmax` bytes.
///
/// The continuation marker takes one byte, so on a stock kernel
/// (`msgmax = 8192`) a frame carries 8191 payload bytes. Raising
/// `kernel.msgmax` to 8193 or more gives the full [`FRAME_CAPACITY`].
fn payload_capacity(msgmax: usize) -> usize {
    msgmax.saturating_sub(CONTINUATION_SIZE).min(FRAME_CAPACITY)
}

/// Host message buffer: `mtype` followed by the marker byte and payload.
#[repr(C)]
struct RawFrame {
    mtype: libc::c_long,
    mtext: [u8; TEXT_SIZE],
}

impl RawFrame {
    fn boxed(mtype: libc::c_long) -> Box<Self> {
        Box::new(Self {
            mtype,
            mtext: [0u8; TEXT_SIZE],
        })
    }
}

/// System V message queue transport (`msgget`/`msgsnd`/`msgrcv`/`msgctl`).
///
/// Stateless: every call maps to one host syscall, restarted if a signal
/// interrupts it. A failed `msgsnd` may be followed by an `IPC_STAT` to
/// classify the error.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysvTransport;

impl SysvTransport {
    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "sysv-msg"
    }

    fn is_live(&self, channel: ChannelId) -> bool {
        self.stat(channel).is_ok()
    }

    /// `msgsnd` reports both a stale id and an oversized message as `EINVAL`.
    fn send_error(&self, channel: ChannelId, size: usize, err: io::Error) -> TransportError {
        if err.raw_os_error() == Some(libc::EINVAL) && self.is_live(channel) {
            return TransportError::PayloadTooLarge {
                size,
                max: self.frame_capacity(),
            };
        }
        TransportError::from_errno(channel.raw(), err)
    }
}

fn wait_flags(wait: WaitMode) -> libc::c_int {
    match wait {
        WaitMode::Block => 0,
        WaitMode::NoWait => libc::IPC_NOWAIT,
    }
}

fn host_type(mtype: i64) -> Result<libc::c_long> {
    check_type(mtype)?;
    libc::c_long::try_from(mtype).map_err(|_| TransportError::InvalidType(mtype))
}

impl FrameTransport for SysvTransport {
    fn frame_capacity(&self) -> usize {
        payload_capacity(host_msgmax())
    }

    fn open(&self, key: ChannelKey, flags: OpenFlags) -> Result<ChannelId> {
        let mode = match flags.mode {
            OpenMode::Open => 0,
            OpenMode::Create => libc::IPC_CREAT,
            OpenMode::CreateExclusive => libc::IPC_CREAT | libc::IPC_EXCL,
        };
        let msgflg = mode | (flags.permissions & 0o777) as libc::c_int;

        // SAFETY: msgget takes no pointers.
        let id = unsafe { libc::msgget(key.raw() as libc::key_t, msgflg) };
        if id < 0 {
            return Err(TransportError::from_errno(-1, io::Error::last_os_error()));
        }
        debug!(key = %key, id, "msgget");
        Ok(ChannelId(id))
    }

    fn remove(&self, channel: ChannelId) -> Result<()> {
        // SAFETY: IPC_RMID ignores the buffer argument, so null is allowed.
        let rc = unsafe { libc::msgctl(channel.raw(), libc::IPC_RMID, std::ptr::null_mut()) };
        if rc < 0 {
            return Err(TransportError::from_errno(
                channel.raw(),
                io::Error::last_os_error(),
            ));
        }
        Ok(())
    }

    fn send_frame(
        &self,
        channel: ChannelId,
        mtype: i64,
        continuation: bool,
        payload: &[u8],
        wait: WaitMode,
    ) -> Result<()> {
        let host_mtype = host_type(mtype)?;
        check_payload(payload, self.frame_capacity())?;

        let mut raw = RawFrame::boxed(host_mtype);
        raw.mtext[0] = if continuation { MORE } else { LAST };
        raw.mtext[CONTINUATION_SIZE..CONTINUATION_SIZE + payload.len()].copy_from_slice(payload);
        let size = CONTINUATION_SIZE + payload.len();

        loop {
            // SAFETY: `raw` is a live `RawFrame` whose text holds at least `size` bytes.
            let rc = unsafe {
                libc::msgsnd(
                    channel.raw(),
                    (&*raw as *const RawFrame).cast::<libc::c_void>(),
                    size,
                    wait_flags(wait),
                )
            };
            if rc == 0 {
                trace!(channel = %channel, mtype, continuation, size, "msgsnd");
                return Ok(());
            }

            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(self.send_error(channel, payload.len(), err));
        }
    }

    fn receive_frame(&self, channel: ChannelId, mtype: i64, wait: WaitMode) -> Result<Frame> {
        let host_mtype = host_type(mtype)?;
        let mut raw = RawFrame::boxed(0);

        let len = loop {
            // SAFETY: `raw` is a live, writable `RawFrame` with `TEXT_SIZE` bytes of text.
            let n = unsafe {
                libc::msgrcv(
                    channel.raw(),
                    (&mut *raw as *mut RawFrame).cast::<libc::c_void>(),
                    TEXT_SIZE,
                    host_mtype,
                    wait_flags(wait),
                )
            };
            if n >= 0 {
                break n as usize;
            }

            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EINTR) => continue,
                Some(libc::E2BIG) => {
                    return Err(TransportError::MalformedFrame(format!(
                        "queued frame exceeds capacity of {FRAME_CAPACITY} bytes"
                    )))
                }
                _ => return Err(TransportError::from_errno(channel.raw(), err)),
            }
        };

        if len < CONTINUATION_SIZE {
            return Err(TransportError::MalformedFrame(
                "missing continuation marker".to_string(),
            ));
        }
        let continuation = decode_continuation(raw.mtext[0])?;
        let payload = Bytes::copy_from_slice(&raw.mtext[CONTINUATION_SIZE..len]);
        trace!(channel = %channel, mtype, continuation, size = len, "msgrcv");

        Ok(Frame {
            mtype: i64::from(raw.mtype),
            continuation,
            payload,
        })
    }

    fn stat(&self, channel: ChannelId) -> Result<QueueStat> {
        // SAFETY: msqid_ds is a plain C struct; all-zero is a valid value.
        let mut ds: libc::msqid_ds = unsafe { std::mem::zeroed() };
        // SAFETY: `ds` is a valid writable msqid_ds for IPC_STAT.
        let rc = unsafe { libc::msgctl(channel.raw(), libc::IPC_STAT, &mut ds) };
        if rc < 0 {
            return Err(TransportError::from_errno(
                channel.raw(),
                io::Error::last_os_error(),
            ));
        }
        Ok(QueueStat {
            frames: ds.msg_qnum as u64,
            bytes: None,
            max_bytes: ds.msg_qbytes as u64,
        })
    }
}
