//! Data availability certificate handling: certificate decoding, committee
//! keysets with threshold signatures, and the content-addressing tree hash.

mod cert;
pub use cert::{DasCertError, DasCertificate, DAS_CERT_LEN, DAS_CERT_SIG_LEN};

pub mod dastree;

mod keyset;
pub use keyset::{Keyset, KeysetError, KeysetValidationMode, MAX_KEYSET_KEYS};
