// generic.rs
//! Types shared by every EPS product regardless of instrument.

use super::data_type::{Member, SimpleType, Type};
use crate::Result;

pub const GRH: &str = "grh";
pub const IPR: &str = "ipr";
pub const VINT4: &str = "vint4";
pub const SHORT_CDS_TIME: &str = "short-cds-time";

fn field(name: &str, ty: SimpleType) -> Member {
    Member::new(name, Type::Simple(ty))
}

/// `{ day: u16, millis: u32 }`, 6 bytes.
pub fn short_cds_time() -> Result<Type> {
    Type::compound(
        SHORT_CDS_TIME,
        vec![field("day", SimpleType::U16), field("millis", SimpleType::U32)],
    )
}

/// `{ exponent: i8, mantissa: i32 }`, 5 bytes.
pub fn vint4() -> Result<Type> {
    Type::compound(
        VINT4,
        vec![
            field("exponent", SimpleType::I8),
            field("mantissa", SimpleType::I32),
        ],
    )
}

/// The 20-byte generic record header.
pub fn grh() -> Result<Type> {
    let time = short_cds_time()?;
    Type::compound(
        GRH,
        vec![
            field("RECORD_CLASS", SimpleType::U8),
            field("INSTRUMENT_GROUP", SimpleType::U8),
            field("RECORD_SUBCLASS", SimpleType::U8),
            field("RECORD_SUBCLASS_VERSION", SimpleType::U8),
            field("RECORD_SIZE", SimpleType::U32),
            Member::new("RECORD_START_TIME", time.clone()),
            Member::new("RECORD_STOP_TIME", time),
        ],
    )
}

/// Body of an internal pointer record (7 bytes).
pub fn ipr() -> Result<Type> {
    Type::compound(
        IPR,
        vec![
            field("TARGET_RECORD_CLASS", SimpleType::U8),
            field("TARGET_INSTRUMENT_GROUP", SimpleType::U8),
            field("TARGET_RECORD_SUBCLASS", SimpleType::U8),
            field("TARGET_RECORD_OFFSET", SimpleType::U32),
        ],
    )
}

/// A full record: the generic header followed by the members of `body`.
///
/// Body members are flattened into the record compound so that a record
/// field is addressed by its own name rather than through a `body` member.
/// A non-compound body is kept as a single `body` member.
pub fn with_header(name: &str, header: &Type, body: &Type) -> Result<Type> {
    let mut members = vec![Member::new(GRH, header.clone())];
    match body {
        Type::Compound(c) => members.extend(c.members().iter().cloned()),
        other => members.push(Member::new("body", other.clone())),
    }
    Type::compound(name, members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{GRH_SIZE, IPR_RECORD_SIZE, SHORT_CDS_TIME_SIZE, VINT4_SIZE};

    #[test]
    fn generic_sizes_match_record_codecs() -> Result<()> {
        assert_eq!(grh()?.size(), Some(GRH_SIZE as u64));
        assert_eq!(
            ipr()?.size(),
            Some((IPR_RECORD_SIZE - GRH_SIZE) as u64)
        );
        assert_eq!(vint4()?.size(), Some(VINT4_SIZE as u64));
        assert_eq!(short_cds_time()?.size(), Some(SHORT_CDS_TIME_SIZE as u64));
        Ok(())
    }

    #[test]
    fn record_flattens_body_members() -> Result<()> {
        let record = with_header("ipr-record", &grh()?, &ipr()?)?;
        let compound = record.as_compound().unwrap();
        assert_eq!(compound.members().len(), 5);
        assert_eq!(compound.member("TARGET_RECORD_OFFSET").unwrap().0, 4);
        assert_eq!(record.size(), Some(IPR_RECORD_SIZE as u64));
        Ok(())
    }
}
