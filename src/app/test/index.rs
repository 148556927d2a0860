#[cfg(test)]
#[suitest::suite(index_service_tests)]
#[suitest::suite_cfg(sequential = true)]
mod index_service_tests {
    use crate::{
        app::test::{StubSource, TestState, STUB},
        core::{
            chunk::ChunkConfig,
            vector::{BuildOptions, VectorIndex},
        },
        error::SeferErr,
    };
    use std::path::Path;
    use suitest::{after_all, before_all, cleanup};

    const TEST_INDEX_PATH: &str = "__index_service_test__";

    #[before_all]
    async fn setup() -> TestState {
        let _ = tokio::fs::remove_dir_all(TEST_INDEX_PATH).await;

        let test_state = TestState::init(StubSource::new(&[
            ("Genesis 1", "the cat sat"),
            ("Genesis 2", "the dog ran"),
            ("Genesis 3", "a bird flew"),
            ("Blank", "  \n\n  "),
        ]));

        test_state
    }

    #[cleanup]
    async fn cleanup() {
        let _ = tokio::fs::remove_dir_all(TEST_INDEX_PATH).await;
    }

    #[after_all]
    async fn teardown() {
        let _ = tokio::fs::remove_dir_all(TEST_INDEX_PATH).await;
    }

    fn references(refs: &[&str]) -> Vec<String> {
        refs.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    async fn build_skips_failed_units(state: TestState) {
        let path = Path::new(TEST_INDEX_PATH).join("skips");
        let service = state
            .app
            .index_service(STUB, ChunkConfig::default(), BuildOptions::default())
            .unwrap();

        let report = service
            .build(&references(&["Genesis 2", "Missing", "Genesis 1"]), &path)
            .await
            .unwrap();

        assert_eq!(2, report.units_ok);
        assert_eq!(1, report.units_failed.len());
        assert_eq!("Missing", report.units_failed[0].0);
        assert_eq!(2, report.chunks);
        assert_eq!(8, report.dimensions);

        let index = VectorIndex::load(&path).await.unwrap();
        let sources = index
            .entries()
            .iter()
            .map(|e| e.chunk.metadata.source.as_str())
            .collect::<Vec<_>>();

        assert_eq!(vec!["Genesis 2", "Genesis 1"], sources);
        assert_eq!(STUB, index.manifest().provider);
        assert_eq!("word-overlap", index.manifest().model);
    }

    #[test]
    async fn build_without_units_writes_nothing(state: TestState) {
        let path = Path::new(TEST_INDEX_PATH).join("nothing");
        let service = state
            .app
            .index_service(STUB, ChunkConfig::default(), BuildOptions::default())
            .unwrap();

        let err = service
            .build(&references(&["Missing", "Also missing"]), &path)
            .await
            .unwrap_err();

        assert!(matches!(err.error, SeferErr::EmptyCorpus(_)));
        assert_eq!("fetch", err.stage());
        assert!(!path.exists());
    }

    #[test]
    async fn build_without_chunks_writes_nothing(state: TestState) {
        let path = Path::new(TEST_INDEX_PATH).join("blank");
        let service = state
            .app
            .index_service(STUB, ChunkConfig::default(), BuildOptions::default())
            .unwrap();

        let err = service
            .build(&references(&["Blank"]), &path)
            .await
            .unwrap_err();

        assert!(matches!(err.error, SeferErr::EmptyCorpus(_)));
        assert!(!path.exists());
    }

    #[test]
    async fn build_concatenated(state: TestState) {
        let path = Path::new(TEST_INDEX_PATH).join("concatenated");
        let service = state
            .app
            .index_service(
                STUB,
                ChunkConfig::new(30, 0).concatenated(),
                BuildOptions::default(),
            )
            .unwrap();

        let report = service
            .build(&references(&["Genesis 1", "Genesis 2"]), &path)
            .await
            .unwrap();

        assert_eq!(1, report.chunks);

        let index = VectorIndex::load(&path).await.unwrap();
        assert_eq!("the cat sat\n\nthe dog ran", index.entries()[0].chunk.text);
        assert_eq!("Genesis 1", index.entries()[0].chunk.metadata.source);
    }

    #[test]
    async fn build_on_spawned_task(state: TestState) {
        let path = Path::new(TEST_INDEX_PATH).join("spawned");
        let service = state
            .app
            .index_service(STUB, ChunkConfig::default(), BuildOptions::default())
            .unwrap();

        let refs = references(&["Genesis 1", "Genesis 3"]);
        let report = tokio::spawn(async move { service.build(&refs, path).await })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(2, report.units_ok);
        assert_eq!(2, report.chunks);
    }

    #[test]
    async fn build_with_unknown_source(state: TestState) {
        let err = state
            .app
            .index_service("nope", ChunkConfig::default(), BuildOptions::default())
            .err()
            .unwrap();

        assert!(matches!(err.error, SeferErr::InvalidProvider(_)));
    }
}

#[cfg(test)]
mod index_service_logging_tests {
    use crate::{
        app::test::{temp_dir, StubSource, WordEmbedder},
        core::service::index::IndexService,
    };
    use std::sync::Arc;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn skipped_units_are_logged() {
        let dir = temp_dir();
        let service = IndexService::new(
            Arc::new(StubSource::new(&[("Genesis 1", "the cat sat")])),
            Arc::new(WordEmbedder::default()),
        );

        let references = vec!["Genesis 1".to_string(), "Genesis 99".to_string()];
        let report = service.build(&references, dir.join("index")).await.unwrap();

        assert_eq!(1, report.units_ok);
        assert!(logs_contain("Skipping 'Genesis 99'"));

        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
