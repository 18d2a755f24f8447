use eps_rs::{
    EpsProduct, EpsWriter, Error, ErrorKind, HeaderRecord, InstrumentGroup, LookupKind,
    RecordClass, RecordKey, Result, SchemaRegistry,
};
use std::sync::Arc;

const SMALL_CATALOG: &str = r#"{
    "name": "small",
    "records": [
        { "key": "mdr:iasi:2", "name": "mdr-small", "members": [
            { "name": "value", "type": "u16" }
        ] },
        { "key": "geadr", "name": "geadr", "members": [
            { "name": "AUX_DATA_POINTER", "type": "u8", "dims": [4] }
        ] }
    ]
}"#;

fn registry() -> Result<Arc<SchemaRegistry>> {
    Ok(Arc::new(SchemaRegistry::from_catalog(SMALL_CATALOG)?))
}

fn mdr_key() -> RecordKey {
    RecordKey::new(RecordClass::Mdr, InstrumentGroup::Iasi, 2)
}

fn mphr() -> HeaderRecord {
    HeaderRecord::new(
        RecordClass::Mphr,
        vec![("PRODUCT_NAME".to_string(), "SMALL".to_string())],
    )
}

fn write_mdrs(writer: &mut EpsWriter<eps_rs::writer::VecWriter>, values: &[u16]) -> Result<()> {
    for value in values {
        writer.write_record(mdr_key(), 1, &value.to_be_bytes())?;
    }
    Ok(())
}

/// MPHR, one pointer and `values.len()` two-byte MDRs.
fn small_product(values: &[u16]) -> Result<Vec<u8>> {
    let mut writer = EpsWriter::in_memory();
    writer.write_header(&mphr())?;
    let mdrs = writer.write_pointer(mdr_key())?;
    writer.begin_run(mdrs)?;
    write_mdrs(&mut writer, values)?;
    Ok(writer.finish()?.into_inner())
}

#[test]
fn minimal_product() -> Result<()> {
    let product = EpsProduct::from_bytes(small_product(&[7, 8, 9])?, registry()?)?;
    assert_eq!(product.raw().header_size(), u64::from(mphr().header.record_size));
    assert_eq!(product.mdr_count()?, 3);

    let mdrs = product.mdr_sequence()?.expect("mdr run");
    assert_eq!(mdrs.compound(2)?.value("value")?.as_u64(), Some(9));
    assert_eq!(mdrs.compound(1)?.byte_len()?, 22);

    let run = &product.runs()?[0];
    assert_eq!(run.record_size, Some(22));
    assert_eq!(product.raw().record_bytes(run, 1)?.len(), 22);
    Ok(())
}

#[test]
fn zero_mdrs() -> Result<()> {
    let product = EpsProduct::from_bytes(small_product(&[])?, registry()?)?;
    assert_eq!(product.mdr_count()?, 0);
    assert!(product.mdr_sequence()?.expect("mdr run").is_empty());
    Ok(())
}

#[test]
fn product_without_mdr_pointer_is_rejected() -> Result<()> {
    let geadr = RecordKey::new(RecordClass::Geadr, InstrumentGroup::Iasi, 1);
    let mut writer = EpsWriter::in_memory();
    writer.write_header(&mphr())?;
    writer.write_pointer(geadr)?;
    let bytes = writer.finish()?.into_inner();

    let err = EpsProduct::from_bytes(bytes, registry()?).unwrap_err();
    assert!(matches!(err, Error::MissingMdrPointer { scanned: 1 }));
    assert_eq!(err.kind(), ErrorKind::Format);
    Ok(())
}

#[test]
fn first_record_must_be_mphr() -> Result<()> {
    let mut bytes = small_product(&[1])?;
    bytes[0] = RecordClass::Sphr as u8;
    let err = EpsProduct::from_bytes(bytes, registry()?).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    Ok(())
}

#[test]
fn invalid_enumeration_byte_is_a_format_error() -> Result<()> {
    let mut bytes = small_product(&[1])?;
    let ipr = mphr().header.record_size as usize;
    bytes[ipr] = 42;
    let err = EpsProduct::from_bytes(bytes.clone(), registry()?).unwrap_err();
    assert!(matches!(err, Error::InvalidRecordClass(42)));

    bytes[ipr] = RecordClass::Ipr as u8;
    bytes[ipr + 1] = 200;
    let err = EpsProduct::from_bytes(bytes, registry()?).unwrap_err();
    assert!(matches!(err, Error::InvalidInstrumentGroup(200)));
    assert_eq!(err.kind(), ErrorKind::Format);
    Ok(())
}

#[test]
fn pointers_must_ascend() -> Result<()> {
    let geadr = RecordKey::new(RecordClass::Geadr, InstrumentGroup::Iasi, 1);
    let mut writer = EpsWriter::in_memory();
    writer.write_header(&mphr())?;
    let aux = writer.write_pointer(geadr)?;
    let mdrs = writer.write_pointer(mdr_key())?;
    writer.begin_run(mdrs)?;
    write_mdrs(&mut writer, &[1])?;
    writer.begin_run(aux)?;
    writer.write_record(geadr, 1, &[0; 4])?;
    let bytes = writer.finish()?.into_inner();

    let err = EpsProduct::from_bytes(bytes, registry()?).unwrap_err();
    assert!(matches!(err, Error::PointerOutOfOrder { .. }));
    Ok(())
}

#[test]
fn secondary_header_is_detected() -> Result<()> {
    let sphr = HeaderRecord::new(
        RecordClass::Sphr,
        vec![("SRC_DATA_QUAL".to_string(), "0".to_string())],
    );
    let mut writer = EpsWriter::in_memory();
    writer.write_header(&mphr())?;
    writer.write_header(&sphr)?;
    let mdrs = writer.write_pointer(mdr_key())?;
    writer.begin_run(mdrs)?;
    write_mdrs(&mut writer, &[5, 6])?;
    let bytes = writer.finish()?.into_inner();

    let product = EpsProduct::from_bytes(bytes, registry()?)?;
    assert_eq!(product.sphr().and_then(|s| s.get("SRC_DATA_QUAL")), Some("0"));
    assert_eq!(
        product.raw().header_size(),
        u64::from(mphr().header.record_size + sphr.header.record_size)
    );
    assert_eq!(product.mdr_count()?, 2);
    assert!(product.root()?.compound_type().member("sphr").is_some());
    Ok(())
}

#[test]
fn unknown_record_becomes_an_opaque_run() -> Result<()> {
    let viadr = RecordKey::new(RecordClass::Viadr, InstrumentGroup::Iasi, 9);
    let mut writer = EpsWriter::in_memory();
    writer.write_header(&mphr())?;
    let aux = writer.write_pointer(viadr)?;
    let mdrs = writer.write_pointer(mdr_key())?;
    writer.begin_run(aux)?;
    writer.write_record(viadr, 1, &[0xAB; 30])?;
    writer.begin_run(mdrs)?;
    write_mdrs(&mut writer, &[1, 2])?;
    let bytes = writer.finish()?.into_inner();

    let product = EpsProduct::from_bytes(bytes, registry()?)?;
    let runs = product.runs()?;
    assert_eq!(runs[0].lookup, LookupKind::Unknown);
    assert!(runs[0].is_opaque());
    assert_eq!(runs[0].name, "viadr:iasi:9");
    assert_eq!(runs[0].span, 50);
    assert_eq!(runs[0].count, 1);

    let opaque = product.raw().records(&runs[0])?;
    assert_eq!(opaque.sequence(0)?.raw_bytes()?.len(), 50);
    assert_eq!(product.mdr_count()?, 2);
    Ok(())
}

#[test]
fn class_fallback_lookup() -> Result<()> {
    let geadr = RecordKey::new(RecordClass::Geadr, InstrumentGroup::Avhrr, 3);
    let mut writer = EpsWriter::in_memory();
    writer.write_header(&mphr())?;
    let aux = writer.write_pointer(geadr)?;
    let mdrs = writer.write_pointer(mdr_key())?;
    writer.begin_run(aux)?;
    writer.write_record(geadr, 1, b"AUX1")?;
    writer.write_record(geadr, 1, b"AUX2")?;
    writer.begin_run(mdrs)?;
    write_mdrs(&mut writer, &[1])?;
    let bytes = writer.finish()?.into_inner();

    let product = EpsProduct::from_bytes(bytes, registry()?)?;
    let run = &product.runs()?[0];
    assert_eq!(run.lookup, LookupKind::ClassFallback);
    assert_eq!(run.count, 2);
    let records = product.aux_data_record("geadr")?.expect("geadr run");
    let second = records.compound(1)?.sequence("AUX_DATA_POINTER")?.raw_bytes()?;
    assert_eq!(second, b"AUX2");
    Ok(())
}

#[test]
fn gap_after_pointer_table() -> Result<()> {
    let mut writer = EpsWriter::in_memory();
    writer.write_header(&mphr())?;
    let mdrs = writer.write_pointer(mdr_key())?;
    writer.write_raw(&[0; 12])?;
    writer.begin_run(mdrs)?;
    write_mdrs(&mut writer, &[3])?;
    let bytes = writer.finish()?.into_inner();

    let product = EpsProduct::from_bytes(bytes, registry()?)?;
    let root = product.root()?;
    assert_eq!(root.member_size("gap")?, 12);
    assert_eq!(
        root.member_offset("body")?,
        product.raw().pointer_table_end() + 12
    );
    assert_eq!(product.mdr_count()?, 1);
    Ok(())
}

#[test]
fn trailing_bytes_after_last_record() -> Result<()> {
    let mut bytes = small_product(&[1, 2])?;
    bytes.extend_from_slice(&[0xFF; 5]);

    let product = EpsProduct::from_bytes(bytes, registry()?)?;
    assert_eq!(product.mdr_count()?, 2);
    let layout = product.raw().layout()?;
    let body = layout.ty.as_compound().expect("body compound");
    assert_eq!(
        body.member("mdr-small-padding").map(|(_, m)| m.ty.size()),
        Some(Some(5))
    );
    Ok(())
}

#[test]
fn truncated_header_fails() -> Result<()> {
    let bytes = small_product(&[1])?;
    let cut = bytes[..10].to_vec();
    let err = EpsProduct::from_bytes(cut, registry()?).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    Ok(())
}
