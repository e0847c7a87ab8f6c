//! SyncBus slot mirroring protocol
//!
//! A client mirrors fixed-size data slots owned by a server and can push
//! its own copy back. Both sides exchange short checksummed frames over any
//! byte transport (typically a UART). Many servers may share one bus; each
//! only reacts to frames carrying its own identifier.
//!
//! # Protocol Overview
//!
//! ```text
//! ┌────────────┬─────────┬──────────┬─────────────┬──────────┐
//! │ SERVER ID  │ SLOT ID │ FUNCTION │ PAYLOAD     │ CRC16    │
//! │ 4B LE      │ 1B      │ 1B       │ 0–56B       │ 2B LO,HI │
//! └────────────┴─────────┴──────────┴─────────────┴──────────┘
//! ```
//!
//! | Function | Direction       | Payload          |
//! |----------|-----------------|------------------|
//! | GetReq   | client → server | none             |
//! | SetReq   | client → server | new slot value   |
//! | GetResp  | server → client | current value    |
//! | SetResp  | server → client | none (`set-ack`) |
//!
//! There are no sequence numbers, timeouts or retries: every call either
//! completes or returns an [`Error`] synchronously.
//!
//! Frames are at most [`MAX_FRAME_SIZE`] (64) bytes, so a slot holds at most
//! [`MAX_PAYLOAD_SIZE`] (56) bytes. The limit is a crate constant, not a
//! build option; split larger records over several slots.
//!
//! # Example
//!
//! ```
//! use syncbus::{Client, Link, Server, SlotCell};
//!
//! const ID: u32 = 0x12345678;
//!
//! let served = SlotCell::new([1, 2, 3, 4]);
//! let mirror = SlotCell::<4>::default();
//!
//! let to_server = Link::new();
//! let to_client = Link::new();
//!
//! let mut client: Client<_, _, 4> = Client::new(&to_server);
//! client.register(mirror.cells(), ID, 2).unwrap();
//!
//! let mut server: Server<_, _, 4> = Server::with_sink(ID, &to_client);
//! server.register_slot(served.cells(), 2).unwrap();
//!
//! to_server.connect(&server);
//! to_client.connect(&client);
//!
//! client.request_get(ID, 0).unwrap();
//! assert_eq!(mirror.get(), [1, 2, 3, 4]);
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod client;
pub mod crc;
pub mod error;
pub mod frame;
pub mod serial;
pub mod server;
pub mod slot;
pub mod transport;

pub use client::{Client, ClientSlot};
pub use crc::{append_checksum, crc16, verify_checksum};
pub use error::{Error, Result};
pub use frame::{
    encode_header, Frame, Function, HEADER_SIZE, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE, MIN_FRAME_SIZE,
};
pub use serial::SerialSink;
pub use server::{Server, ServerSlot};
pub use slot::SlotCell;
pub use transport::{ChangeObserver, FrameReceiver, FrameSink, Link, NoObserver, NoSink};
