//! End-to-end tests for the two-phase transform
//!
//! Runs the coordinator against a real SQLite staging store and an in-memory
//! database sink.

use async_trait::async_trait;
use folio::adapters::database::{CompanyRow, DatabaseSink};
use folio::core::pipeline::{
    TransformCoordinator, TransformOptions, TransformOutcome, TransformSummary, UPDATED_AT_KEY,
};
use folio::core::staging::SqliteStaging;
use folio::domain::{FolioError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use test_case::test_case;

const UPDATED_AT: &str = "2024-03-16\n";

const ESTABLISHMENT_TAIL: &str = "\"1\";\"ACME\";\"02\";\"20050103\";\"00\";\"\";\"105\";\"20050103\";\"6201501\";\"6202300,6209100\";\"RUA\";\"DAS FLORES\";\"100\";\"SALA 2\";\"CENTRO\";\"01001000\";\"SP\";\"7107\";\"11\";\"33334444\";\"\";\"\";\"\";\"\";\"contato@acme.com.br\";\"\";\"\"";

/// Sink that keeps everything in memory and can fail on the n-th write
#[derive(Default)]
struct MemorySink {
    records: Mutex<BTreeMap<String, String>>,
    written_ids: Mutex<Vec<String>>,
    meta: Mutex<Vec<(String, String)>>,
    events: Mutex<Vec<&'static str>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fail_at: Option<usize>,
}

impl MemorySink {
    fn failing_at(call: usize) -> Self {
        Self {
            fail_at: Some(call),
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, id: &str) -> serde_json::Value {
        let records = self.records.lock().unwrap();
        serde_json::from_str(&records[id]).unwrap()
    }
}

#[async_trait]
impl DatabaseSink for MemorySink {
    async fn pre_load(&self) -> Result<()> {
        self.events.lock().unwrap().push("pre_load");
        Ok(())
    }

    async fn create_companies(&self, batch: Vec<CompanyRow>) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(2)).await;

        let result = if self.fail_at == Some(call) {
            Err(FolioError::Database(format!("write {call} rejected")))
        } else {
            let mut records = self.records.lock().unwrap();
            let mut written = self.written_ids.lock().unwrap();
            for row in batch {
                written.push(row.id.clone());
                records.insert(row.id, row.json);
            }
            self.events.lock().unwrap().push("create_companies");
            Ok(())
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn post_load(&self) -> Result<()> {
        self.events.lock().unwrap().push("post_load");
        Ok(())
    }

    async fn meta_save(&self, key: &str, value: &str) -> Result<()> {
        self.events.lock().unwrap().push("meta_save");
        self.meta
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        Ok(())
    }

    fn database_name(&self) -> &str {
        "memory"
    }
}

fn write_lookups(dir: &Path) {
    std::fs::write(
        dir.join("Cnaes.csv"),
        "\"6201501\";\"Desenvolvimento de programas de computador sob encomenda\"\n\
         \"6202300\";\"Desenvolvimento e licenciamento de programas customizaveis\"\n",
    )
    .unwrap();
    std::fs::write(dir.join("Motivos.csv"), "\"00\";\"SEM MOTIVO\"\n").unwrap();
    // ISO-8859-1: 0xC3 is Ã
    std::fs::write(dir.join("Municipios.csv"), b"\"7107\";\"S\xc3O PAULO\"\n").unwrap();
    std::fs::write(
        dir.join("Naturezas.csv"),
        "\"2062\";\"Sociedade Empresaria Limitada\"\n\"2135\";\"Empresario (Individual)\"\n",
    )
    .unwrap();
    std::fs::write(dir.join("Paises.csv"), "\"105\";\"BRASIL\"\n").unwrap();
    std::fs::write(
        dir.join("Qualificacoes.csv"),
        "\"49\";\"Socio-Administrador\"\n\"50\";\"Empresario\"\n",
    )
    .unwrap();
    std::fs::write(dir.join("updated_at.txt"), UPDATED_AT).unwrap();
}

/// Extract with rows for 11111111, 22222222 and 11111111 again
fn write_small_extract(dir: &Path) {
    write_lookups(dir);
    std::fs::write(
        dir.join("Empresas0.csv"),
        "\"11111111\";\"ACME LTDA\";\"2062\";\"49\";\"1000,00\";\"01\";\"\"\n\
         \"22222222\";\"JOAO DA SILVA\";\"2135\";\"50\";\"0,00\";\"01\";\"\"\n\
         \"11111111\";\"ACME COMERCIO LTDA\";\"\";\"\";\"\";\"\";\"\"\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("Estabelecimentos0.csv"),
        format!(
            "\"11111111\";\"0001\";\"91\";{ESTABLISHMENT_TAIL}\n\
             \"22222222\";\"0001\";\"10\";{ESTABLISHMENT_TAIL}\n"
        ),
    )
    .unwrap();
    std::fs::write(
        dir.join("Socios0.csv"),
        "\"11111111\";\"2\";\"FULANO DE TAL\";\"***123456**\";\"49\";\"20100101\";\"\";\"\";\"\";\"\";\"5\"\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("Simples.csv"),
        "\"11111111\";\"S\";\"20180101\";\"00000000\";\"N\";\"\";\"\"\n",
    )
    .unwrap();
}

/// Extract with `count` companies, one establishment each
fn write_extract_with(dir: &Path, count: usize) -> Vec<String> {
    write_lookups(dir);
    let ids: Vec<String> = (0..count).map(|i| format!("{:08}", 10_000_000 + i)).collect();

    let companies: String = ids
        .iter()
        .map(|id| format!("\"{id}\";\"EMPRESA {id}\";\"2062\";\"49\";\"100,00\";\"03\";\"\"\n"))
        .collect();
    let establishments: String = ids
        .iter()
        .map(|id| format!("\"{id}\";\"0001\";\"00\";{ESTABLISHMENT_TAIL}\n"))
        .collect();

    std::fs::write(dir.join("Empresas0.csv"), companies).unwrap();
    std::fs::write(dir.join("Estabelecimentos0.csv"), establishments).unwrap();
    std::fs::write(dir.join("Socios0.csv"), "").unwrap();
    std::fs::write(dir.join("Simples.csv"), "").unwrap();
    ids
}

fn options(dir: &Path, batch_size: usize, parallel: usize) -> TransformOptions {
    TransformOptions {
        directory: dir.to_path_buf(),
        batch_size,
        max_parallel_db_queries: parallel,
        ..TransformOptions::default()
    }
}

fn coordinator(
    options: TransformOptions,
    sink: &Arc<MemorySink>,
    staging_parent: &Path,
) -> TransformCoordinator<SqliteStaging> {
    let sink: Arc<dyn DatabaseSink> = sink.clone();
    TransformCoordinator::new(options, Some(sink)).with_staging_parent(staging_parent)
}

fn written(outcome: TransformOutcome) -> TransformSummary {
    match outcome {
        TransformOutcome::Written(summary) => summary,
        TransformOutcome::Staged { path, .. } => panic!("unexpected staged outcome: {path:?}"),
    }
}

fn entries(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

#[tokio::test]
async fn test_both_mode_merges_rows_and_saves_metadata() {
    let source = TempDir::new().unwrap();
    let parent = TempDir::new().unwrap();
    write_small_extract(source.path());
    let sink = Arc::new(MemorySink::default());

    let summary = written(
        coordinator(options(source.path(), 2, 8), &sink, parent.path())
            .execute()
            .await
            .unwrap(),
    );

    assert_eq!(summary.write.companies, 2);
    assert_eq!(summary.write.batches, 1);
    assert_eq!(summary.updated_at, UPDATED_AT);
    assert_eq!(sink.records.lock().unwrap().len(), 2);
    assert_eq!(
        *sink.meta.lock().unwrap(),
        vec![(UPDATED_AT_KEY.to_string(), UPDATED_AT.to_string())]
    );

    let acme = sink.record("11111111");
    assert_eq!(acme["legal_name"], "ACME COMERCIO LTDA");
    assert_eq!(acme["legal_nature"], "Sociedade Empresaria Limitada");
    assert_eq!(acme["responsible_qualification"], "Socio-Administrador");
    assert_eq!(acme["size"], "MICRO EMPRESA");
    assert_eq!(acme["share_capital"], 1000.0);
    assert_eq!(acme["tax_regime"]["simples_opted"], true);
    assert!(acme["tax_regime"]["simples_excluded_at"].is_null());

    let establishment = &acme["establishments"][0];
    assert_eq!(establishment["tax_id"], "11111111000191");
    assert_eq!(establishment["kind"], "MATRIZ");
    assert_eq!(establishment["status"], "ATIVA");
    assert_eq!(establishment["municipality"], "SÃO PAULO");
    assert_eq!(establishment["country"], "BRASIL");
    assert_eq!(establishment["main_activity"]["code"], "6201501");
    assert_eq!(establishment["secondary_activities"].as_array().unwrap().len(), 2);
    assert_eq!(establishment["email"], "contato@acme.com.br");

    let partner = &acme["partners"][0];
    assert_eq!(partner["name"], "FULANO DE TAL");
    assert_eq!(partner["qualification"], "Socio-Administrador");
    assert_eq!(partner["age_range"], "Entre 41 a 50 anos");
}

#[tokio::test]
async fn test_sink_hooks_run_in_order() {
    let source = TempDir::new().unwrap();
    let parent = TempDir::new().unwrap();
    write_extract_with(source.path(), 7);
    let sink = Arc::new(MemorySink::default());

    coordinator(options(source.path(), 2, 3), &sink, parent.path())
        .execute()
        .await
        .unwrap();

    let events = sink.events();
    assert_eq!(events.first(), Some(&"pre_load"));
    assert_eq!(&events[events.len() - 2..], &["post_load", "meta_save"]);
    assert_eq!(
        events.iter().filter(|e| **e == "create_companies").count(),
        4
    );
}

#[test_case(1, 1 ; "batch one parallel one")]
#[test_case(3, 4 ; "batch three parallel four")]
#[test_case(10, 2 ; "batch equal to key count")]
#[test_case(8192, 8 ; "defaults")]
#[tokio::test]
async fn test_every_company_written_exactly_once(batch_size: usize, parallel: usize) {
    let source = TempDir::new().unwrap();
    let parent = TempDir::new().unwrap();
    let ids = write_extract_with(source.path(), 10);
    let sink = Arc::new(MemorySink::default());

    let summary = written(
        coordinator(options(source.path(), batch_size, parallel), &sink, parent.path())
            .execute()
            .await
            .unwrap(),
    );

    let mut written_ids = sink.written_ids.lock().unwrap().clone();
    written_ids.sort();
    assert_eq!(written_ids, ids);
    assert_eq!(summary.write.companies, 10);
    assert_eq!(summary.write.batches as usize, 10usize.div_ceil(batch_size));
    assert!(sink.max_in_flight.load(Ordering::SeqCst) <= parallel);
}

#[tokio::test]
async fn test_batch_size_and_parallelism_do_not_change_records() {
    let source = TempDir::new().unwrap();
    let parent = TempDir::new().unwrap();
    write_small_extract(source.path());

    let serial = Arc::new(MemorySink::default());
    coordinator(options(source.path(), 1, 1), &serial, parent.path())
        .execute()
        .await
        .unwrap();

    let parallel = Arc::new(MemorySink::default());
    coordinator(options(source.path(), 8192, 8), &parallel, parent.path())
        .execute()
        .await
        .unwrap();

    assert_eq!(*serial.records.lock().unwrap(), *parallel.records.lock().unwrap());
    assert_eq!(*serial.meta.lock().unwrap(), *parallel.meta.lock().unwrap());
}

#[tokio::test]
async fn test_both_mode_removes_staging_dir() {
    let source = TempDir::new().unwrap();
    let parent = TempDir::new().unwrap();
    write_small_extract(source.path());
    let sink = Arc::new(MemorySink::default());

    let summary = written(
        coordinator(options(source.path(), 2, 2), &sink, parent.path())
            .execute()
            .await
            .unwrap(),
    );

    assert!(summary.staging_dir.starts_with(parent.path()));
    assert!(!summary.staging_dir.exists());
    assert!(entries(parent.path()).is_empty());
}

#[tokio::test]
async fn test_write_failure_stops_run_and_skips_metadata() {
    let source = TempDir::new().unwrap();
    let parent = TempDir::new().unwrap();
    write_extract_with(source.path(), 6);
    let sink = Arc::new(MemorySink::failing_at(2));

    let err = coordinator(options(source.path(), 1, 1), &sink, parent.path())
        .execute()
        .await
        .unwrap_err();

    assert!(matches!(err, FolioError::Database(_)));
    assert!(err.to_string().contains("write 2 rejected"));
    assert_eq!(sink.calls(), 2);
    assert_eq!(sink.records.lock().unwrap().len(), 1);
    assert!(sink.meta.lock().unwrap().is_empty());
    assert!(!sink.events().contains(&"post_load"));
    assert!(entries(parent.path()).is_empty());
}

#[tokio::test]
async fn test_write_failure_with_parallel_writers() {
    let source = TempDir::new().unwrap();
    let parent = TempDir::new().unwrap();
    write_extract_with(source.path(), 40);
    let sink = Arc::new(MemorySink::failing_at(3));

    let err = coordinator(options(source.path(), 2, 4), &sink, parent.path())
        .execute()
        .await
        .unwrap_err();

    assert!(matches!(err, FolioError::Database(_)));
    assert!(sink.calls() < 20);
    assert!(sink.meta.lock().unwrap().is_empty());
    assert!(entries(parent.path()).is_empty());
}

#[test_case(true ; "step one")]
#[test_case(false ; "both")]
#[tokio::test]
async fn test_malformed_extract_removes_staging_dir(step_one: bool) {
    let source = TempDir::new().unwrap();
    let parent = TempDir::new().unwrap();
    write_small_extract(source.path());
    std::fs::write(source.path().join("Empresas0.csv"), "\"11111111\";\"ACME LTDA\"\n").unwrap();
    let sink = Arc::new(MemorySink::default());

    let err = coordinator(
        TransformOptions {
            step_one,
            ..options(source.path(), 2, 2)
        },
        &sink,
        parent.path(),
    )
    .execute()
    .await
    .unwrap_err();

    assert!(matches!(err, FolioError::Input(_)));
    assert!(err.to_string().contains("step one"));
    assert!(err.to_string().contains("Empresas0.csv:1"));
    assert!(entries(parent.path()).is_empty());
    assert_eq!(sink.calls(), 0);
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn test_step_one_keeps_staging_dir_for_step_two() {
    let source = TempDir::new().unwrap();
    let parent = TempDir::new().unwrap();
    write_small_extract(source.path());

    let step_one = TransformOptions {
        step_one: true,
        ..options(source.path(), 2, 2)
    };
    let outcome = TransformCoordinator::<SqliteStaging>::new(step_one, None)
        .with_staging_parent(parent.path())
        .execute()
        .await
        .unwrap();

    let (path, load) = match outcome {
        TransformOutcome::Staged { path, load } => (path, load),
        TransformOutcome::Written(_) => panic!("step one must not write"),
    };
    assert!(path.starts_with(parent.path()));
    assert!(path.join("staging.db").exists());
    assert_eq!(load.companies, 3);
    assert_eq!(load.keys, 2);

    let sink = Arc::new(MemorySink::default());
    let step_two = TransformOptions {
        step_two: path.to_string_lossy().into_owned(),
        ..options(source.path(), 2, 2)
    };
    let summary = written(
        coordinator(step_two, &sink, parent.path())
            .execute()
            .await
            .unwrap(),
    );

    assert!(summary.load.is_none());
    assert_eq!(summary.write.companies, 2);
    assert_eq!(sink.meta.lock().unwrap().len(), 1);
    // Caller-supplied directories are never removed
    assert!(path.join("staging.db").exists());
    assert_eq!(entries(parent.path()), vec![path]);
}

#[tokio::test]
async fn test_step_two_on_missing_store_fails_without_writes() {
    let source = TempDir::new().unwrap();
    let empty = TempDir::new().unwrap();
    write_small_extract(source.path());
    let sink = Arc::new(MemorySink::default());

    let step_two = TransformOptions {
        step_two: empty.path().to_string_lossy().into_owned(),
        ..options(source.path(), 2, 2)
    };
    let err = coordinator(step_two, &sink, empty.path())
        .execute()
        .await
        .unwrap_err();

    assert!(matches!(err, FolioError::Storage(_)));
    assert!(sink.events().is_empty());
    assert!(empty.path().exists());
}

#[tokio::test]
async fn test_invalid_mode_has_no_side_effects() {
    let source = TempDir::new().unwrap();
    let parent = TempDir::new().unwrap();
    write_small_extract(source.path());
    let sink = Arc::new(MemorySink::default());

    let invalid = TransformOptions {
        step_one: true,
        step_two: "/tmp/folio-staging".to_string(),
        ..options(source.path(), 2, 2)
    };
    let err = coordinator(invalid, &sink, parent.path())
        .execute()
        .await
        .unwrap_err();

    assert!(matches!(err, FolioError::Configuration(_)));
    assert!(sink.events().is_empty());
    assert!(entries(parent.path()).is_empty());
}

#[tokio::test]
async fn test_missing_metadata_file_fails_after_write() {
    let source = TempDir::new().unwrap();
    let parent = TempDir::new().unwrap();
    write_small_extract(source.path());
    std::fs::remove_file(source.path().join("updated_at.txt")).unwrap();
    let sink = Arc::new(MemorySink::default());

    let err = coordinator(options(source.path(), 2, 2), &sink, parent.path())
        .execute()
        .await
        .unwrap_err();

    assert!(matches!(err, FolioError::Input(_)));
    assert!(sink.events().contains(&"post_load"));
    assert!(sink.meta.lock().unwrap().is_empty());
    assert!(entries(parent.path()).is_empty());
}

#[tokio::test]
async fn test_privacy_redacts_personal_fields() {
    let source = TempDir::new().unwrap();
    let parent = TempDir::new().unwrap();
    write_small_extract(source.path());
    let sink = Arc::new(MemorySink::default());

    let private = TransformOptions {
        privacy: true,
        ..options(source.path(), 2, 2)
    };
    let summary = written(
        coordinator(private, &sink, parent.path())
            .execute()
            .await
            .unwrap(),
    );
    assert!(summary.write.redacted_fields > 0);

    let acme = sink.record("11111111");
    let establishment = &acme["establishments"][0];
    assert!(establishment["email"].is_null());
    assert!(establishment["phone_1"].is_null());
    assert_eq!(establishment["number"], "100");
    assert!(acme["partners"][0]["tax_id"].is_null());

    // Individual entrepreneur: the address is a home address
    let individual = sink.record("22222222");
    let establishment = &individual["establishments"][0];
    assert!(establishment["number"].is_null());
    assert!(establishment["complement"].is_null());
    assert_eq!(establishment["street"], "DAS FLORES");
}
