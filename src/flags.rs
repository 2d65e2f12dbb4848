//! Flag and enumeration vocabularies stored as plain integers.
//!
//! The query layer treats all of these as opaque integers. The only bits it
//! interprets are [`TxFlags::STATE_MASK`] (is a transaction settled) and
//! [`PaymentFlags::UNPAID`] (is a payment request still open).

// used for persistence
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;

use std::fmt;
use std::ops;

// Generates an integer newtype that can be bound to and read from SQLite.
macro_rules! stored_integer {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub const fn bits(self) -> i64 {
                self.0
            }
        }
        impl From<$name> for i64 {
            fn from(value: $name) -> i64 {
                value.0
            }
        }
        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }
        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value.as_i64().map($name)
            }
        }
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// Adds the bitmask operations on top of a stored integer.
macro_rules! bitmask {
    ($name:ident) => {
        impl $name {
            pub const fn contains(self, other: $name) -> bool {
                self.0 & other.0 == other.0
            }
            pub const fn intersects(self, other: $name) -> bool {
                self.0 & other.0 != 0
            }
        }
        impl ops::BitOr for $name {
            type Output = $name;
            fn bitor(self, other: $name) -> $name {
                $name(self.0 | other.0)
            }
        }
        impl ops::BitAnd for $name {
            type Output = $name;
            fn bitand(self, other: $name) -> $name {
                $name(self.0 & other.0)
            }
        }
        impl ops::Not for $name {
            type Output = $name;
            fn not(self) -> $name {
                $name(!self.0)
            }
        }
    };
}

stored_integer!(
    /// Status bits of a transaction.
    TxFlags
);
bitmask!(TxFlags);

impl TxFlags {
    pub const UNSET: TxFlags = TxFlags(0);

    pub const HAS_FEE: TxFlags = TxFlags(1 << 4);
    pub const HAS_HEIGHT: TxFlags = TxFlags(1 << 5);
    pub const HAS_POSITION: TxFlags = TxFlags(1 << 6);
    pub const HAS_BYTEDATA: TxFlags = TxFlags(1 << 12);
    pub const HAS_PROOF_DATA: TxFlags = TxFlags(1 << 13);

    // The transaction is known to the network and in a block.
    pub const STATE_SETTLED: TxFlags = TxFlags(1 << 20);
    // The transaction was broadcast by this wallet.
    pub const STATE_DISPATCHED: TxFlags = TxFlags(1 << 21);
    // The transaction was received from another party but not broadcast.
    pub const STATE_RECEIVED: TxFlags = TxFlags(1 << 22);
    // The transaction is in the mempool.
    pub const STATE_CLEARED: TxFlags = TxFlags(1 << 23);
    // The transaction is signed but was never shared.
    pub const STATE_SIGNED: TxFlags = TxFlags(1 << 24);

    pub const PAYS_INVOICE: TxFlags = TxFlags(1 << 30);

    pub const STATE_MASK: TxFlags = TxFlags(
        Self::STATE_SETTLED.0
            | Self::STATE_DISPATCHED.0
            | Self::STATE_RECEIVED.0
            | Self::STATE_CLEARED.0
            | Self::STATE_SIGNED.0,
    );

    /// A transaction is settled for history purposes when any state bit is set.
    pub const fn is_settled(self) -> bool {
        self.intersects(Self::STATE_MASK)
    }
}

stored_integer!(
    /// Status bits of a transaction output.
    TransactionOutputFlags
);
bitmask!(TransactionOutputFlags);

impl TransactionOutputFlags {
    pub const NONE: TransactionOutputFlags = TransactionOutputFlags(0);
    pub const IS_SPENT: TransactionOutputFlags = TransactionOutputFlags(1 << 1);
    pub const IS_FROZEN: TransactionOutputFlags = TransactionOutputFlags(1 << 2);
    pub const IS_COINBASE: TransactionOutputFlags = TransactionOutputFlags(1 << 3);
}

stored_integer!(
    /// Status bits of a key instance.
    KeyInstanceFlags
);
bitmask!(KeyInstanceFlags);

impl KeyInstanceFlags {
    pub const NONE: KeyInstanceFlags = KeyInstanceFlags(0);
    pub const IS_ACTIVE: KeyInstanceFlags = KeyInstanceFlags(1 << 0);
    pub const USER_SET_ACTIVE: KeyInstanceFlags = KeyInstanceFlags(1 << 8);
    pub const IS_PAYMENT_REQUEST: KeyInstanceFlags = KeyInstanceFlags(1 << 9);
    pub const IS_INVOICE: KeyInstanceFlags = KeyInstanceFlags(1 << 10);
}

stored_integer!(
    /// State bits of a payment request.
    PaymentFlags
);
bitmask!(PaymentFlags);

impl PaymentFlags {
    pub const NONE: PaymentFlags = PaymentFlags(0);
    pub const UNPAID: PaymentFlags = PaymentFlags(1 << 0);
    pub const EXPIRED: PaymentFlags = PaymentFlags(1 << 1);
    pub const UNKNOWN: PaymentFlags = PaymentFlags(1 << 2);
    pub const PAID: PaymentFlags = PaymentFlags(1 << 3);
    pub const ARCHIVED: PaymentFlags = PaymentFlags(1 << 4);

    pub const STATE_MASK: PaymentFlags = PaymentFlags(
        Self::UNPAID.0 | Self::EXPIRED.0 | Self::UNKNOWN.0 | Self::PAID.0 | Self::ARCHIVED.0,
    );
}

stored_integer!(
    /// Classification of an output's locking script.
    ScriptType
);

impl ScriptType {
    pub const NONE: ScriptType = ScriptType(0);
    pub const COINBASE: ScriptType = ScriptType(1);
    pub const P2PKH: ScriptType = ScriptType(2);
    pub const P2SH: ScriptType = ScriptType(3);
    pub const MULTISIG_P2SH: ScriptType = ScriptType(4);
    pub const MULTISIG_BARE: ScriptType = ScriptType(5);
    pub const MULTISIG_ACCELERATOR: ScriptType = ScriptType(6);
    pub const P2PK: ScriptType = ScriptType(7);
}

stored_integer!(
    /// How the key behind a key instance was derived.
    DerivationType
);

impl DerivationType {
    pub const NONE: DerivationType = DerivationType(0);
    pub const ELECTRUM_MASTER_KEY: DerivationType = DerivationType(1);
    pub const ELECTRUM_OLD: DerivationType = DerivationType(2);
    pub const BIP32: DerivationType = DerivationType(3);
    pub const BIP32_SUBPATH: DerivationType = DerivationType(4);
    pub const IMPORTED: DerivationType = DerivationType(5);
    pub const HARDWARE: DerivationType = DerivationType(6);
    pub const PUBLIC_KEY_HASH: DerivationType = DerivationType(7);
    pub const SCRIPT_HASH: DerivationType = DerivationType(8);
}
