//! Backend flows: fetch a keyset from storage, bind contextual values
//! against it, write back, and import through the merge boundary.

use std::fs;
use std::path::PathBuf;
use strata::backend::{Backend, FileBackend, TransformBackend, TransformState};
use strata::context::{ContextHandle, ContextualValue};
use strata::error::BackendError;
use strata::format::{Format, IniFormat, JsonFormat};
use strata::key::{Key, KeyName};
use strata::keyset::Keyset;
use strata::merge::{merge, MergeStrategy};

fn root() -> KeyName {
    KeyName::parse("user:/app").unwrap()
}

#[test]
fn test_fetch_bind_persist_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.ini");
    fs::write(&path, "[server]\nport = 80\n").unwrap();

    let backend = FileBackend::new(&path, Box::new(IniFormat::new()));
    let ks = backend.fetch(&root()).unwrap().into_shared();

    let c = ContextHandle::default();
    let port = ContextualValue::<i64>::new(
        ks.clone(),
        &c,
        Key::new("user:/app/server/port").unwrap(),
    )
    .unwrap();
    assert_eq!(port.get(), 80);

    port.set(8080);
    backend.persist(&root(), &ks.read()).unwrap();

    let refetched = backend.fetch(&root()).unwrap();
    assert_eq!(
        refetched.lookup("user:/app/server/port").unwrap().string_value(),
        Some("8080")
    );
}

#[test]
fn test_persisted_ini_preserves_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.ini");
    let original = "; tuned by ops\nretries = 3\n[server]\nport = 80\n";
    fs::write(&path, original).unwrap();

    let backend = FileBackend::new(&path, Box::new(IniFormat::new()));
    let ks = backend.fetch(&root()).unwrap();
    backend.persist(&root(), &ks).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn test_import_through_merge_boundary() {
    let base: Keyset = IniFormat::new()
        .parse(b"host = localhost\nport = 80\n", &root())
        .unwrap();
    let incoming: Keyset = IniFormat::new()
        .parse(b"port = 80\ntimeout = 30\n", &root())
        .unwrap();

    let merged = merge(&base, &incoming, MergeStrategy::FailOnConflict).unwrap();
    assert_eq!(
        merged.lookup("user:/app/host").unwrap().string_value(),
        Some("localhost")
    );
    assert_eq!(
        merged.lookup("user:/app/timeout").unwrap().string_value(),
        Some("30")
    );
}

#[test]
fn test_conflicting_import_is_reported() {
    let base: Keyset = IniFormat::new().parse(b"port = 80\n", &root()).unwrap();
    let incoming: Keyset = IniFormat::new().parse(b"port = 443\n", &root()).unwrap();

    let err = merge(&base, &incoming, MergeStrategy::FailOnConflict).unwrap_err();
    assert_eq!(err.conflicts, vec!["user:/app/port".to_string()]);

    let forced = merge(&base, &incoming, MergeStrategy::PreferIncoming).unwrap();
    assert_eq!(forced.lookup("user:/app/port").unwrap().string_value(), Some("443"));
}

/// Filter backend that keeps its stored payload XOR-masked and exposes a
/// plaintext temporary artifact between the two fetch phases.
struct MaskedFile {
    source: PathBuf,
    mask: u8,
}

impl TransformBackend for MaskedFile {
    fn pre_fetch(&self, _root: &KeyName) -> Result<TransformState, BackendError> {
        let masked = fs::read(&self.source)?;
        let plain: Vec<u8> = masked.iter().map(|b| b ^ self.mask).collect();
        let artifact = self.source.with_extension("plain");
        fs::write(&artifact, plain)?;
        Ok(TransformState::with_artifact(artifact))
    }

    fn post_fetch(&self, state: TransformState, ks: Keyset) -> Result<Keyset, BackendError> {
        drop(state);
        Ok(ks)
    }

    fn pre_persist(&self, _root: &KeyName, ks: &Keyset) -> Result<TransformState, BackendError> {
        let plain = IniFormat::new().write(ks)?;
        let artifact = self.source.with_extension("staged");
        fs::write(&artifact, plain)?;
        Ok(TransformState::with_artifact(artifact))
    }

    fn post_persist(&self, mut state: TransformState) -> Result<(), BackendError> {
        let artifact = state.take_artifact().expect("staged artifact");
        let plain = fs::read(&artifact)?;
        let masked: Vec<u8> = plain.iter().map(|b| b ^ self.mask).collect();
        fs::write(&self.source, masked)?;
        strata::backend::secure_erase(&artifact)?;
        Ok(())
    }
}

#[test]
fn test_two_phase_transform_erases_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("app.masked");
    let mask = 0x5a;
    let masked: Vec<u8> = b"port = 80\n".iter().map(|b| b ^ mask).collect();
    fs::write(&source, masked).unwrap();

    let transform = MaskedFile {
        source: source.clone(),
        mask,
    };

    let state = transform.pre_fetch(&root()).unwrap();
    let artifact = state.artifact().unwrap().to_path_buf();
    let bytes = fs::read(&artifact).unwrap();
    let ks = IniFormat::new().parse(&bytes, &root()).unwrap();
    let ks = transform.post_fetch(state, ks).unwrap();

    assert_eq!(ks.lookup("user:/app/port").unwrap().string_value(), Some("80"));
    assert!(!artifact.exists(), "plaintext artifact must be erased");

    let state = transform.pre_persist(&root(), &ks).unwrap();
    let staged = state.artifact().unwrap().to_path_buf();
    transform.post_persist(state).unwrap();
    assert!(!staged.exists(), "staged artifact must be erased");

    let refetched_state = transform.pre_fetch(&root()).unwrap();
    let bytes = fs::read(refetched_state.artifact().unwrap()).unwrap();
    assert_eq!(bytes, b"port = 80\n".to_vec());
}

#[test]
fn test_json_backend_carries_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.json");

    let mut ks = Keyset::new();
    ks.append(
        Key::new("user:/app/port")
            .unwrap()
            .with_value("80")
            .with_meta("default", "8080"),
    );

    let backend = FileBackend::new(&path, Box::new(JsonFormat::new()));
    backend.persist(&root(), &ks).unwrap();
    let fetched = backend.fetch(&root()).unwrap();
    assert_eq!(
        fetched.lookup("user:/app/port").unwrap().meta("default"),
        Some("8080")
    );
}
