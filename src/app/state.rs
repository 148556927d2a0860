use super::source::{fs::FsSource, sefaria::SefariaSource};
use crate::{
    core::{
        chunk::ChunkConfig,
        embedder::Embedder,
        generator::AnswerGenerator,
        provider::{DynEmbedder, DynGenerator, ProviderFactory},
        retriever::Retriever,
        service::{index::IndexService, query::QueryService},
        source::TextSource,
        vector::{BuildOptions, VectorIndex},
    },
    err,
    error::SeferError,
};
use std::{collections::HashMap, path::Path, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
pub struct AppState {
    /// Downstream service providers for sefer services.
    pub providers: AppProviderState,

    /// ID of the embedder new indexes are built with.
    pub embedder: String,
}

impl AppState {
    /// Load the application state using the provided configuration.
    pub fn new(args: &crate::config::StartArgs) -> Result<Self, SeferError> {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from(args.log()))
            .init();

        let providers = AppProviderState {
            embedding: Arc::new(Self::init_embedding_providers(args)?),
            generator: Arc::new(Self::init_generator_providers(args)?),
            source: Arc::new(Self::init_source_providers(args)?),
        };

        let embedder = args.embedder();

        info!(
            "Embedding providers: {:?}, selected '{embedder}'",
            providers.embedding.list_provider_ids()
        );

        Ok(Self {
            providers,
            embedder,
        })
    }

    fn init_embedding_providers(
        args: &crate::config::StartArgs,
    ) -> Result<EmbeddingProvider, SeferError> {
        #[cfg(not(any(feature = "fe-local", feature = "openai")))]
        compile_error!("one of `fe-local` or `openai` features must be enabled");

        let mut provider = EmbeddingProvider::default();

        #[cfg(feature = "openai")]
        {
            match args.openai_config() {
                Some(config) => {
                    let openai = Arc::new(crate::app::embedder::openai::init(&config)?);
                    provider.register(openai.id(), openai);
                }
                None => warn!("OPENAI_KEY not set, the `openai` embedder is unavailable"),
            }
        }

        // Loading a local model may require downloading it
        #[cfg(feature = "fe-local")]
        {
            if args.embedder() == "fastembed" {
                let fastembed = Arc::new(crate::app::embedder::fastembed::init(
                    &args.fastembed_model(),
                )?);
                provider.register(fastembed.id(), fastembed);
            }
        }

        Ok(provider)
    }

    fn init_generator_providers(
        args: &crate::config::StartArgs,
    ) -> Result<GeneratorProvider, SeferError> {
        let mut provider = GeneratorProvider::default();

        if let Some(config) = args.openai_config() {
            let openai = Arc::new(crate::app::generator::openai::OpenAiGenerator::new(&config)?);
            provider.register(openai.id(), openai);
        }

        Ok(provider)
    }

    fn init_source_providers(
        args: &crate::config::StartArgs,
    ) -> Result<TextSourceProvider, SeferError> {
        let mut provider = TextSourceProvider::default();

        let sefaria = Arc::new(SefariaSource::new(&args.sefaria_config())?);
        provider.register(sefaria.id(), sefaria);

        provider.register(FsSource.id(), Arc::new(FsSource));

        Ok(provider)
    }

    /// The embedder new indexes are built with.
    pub fn embedder(&self) -> Result<DynEmbedder, SeferError> {
        self.providers.embedding.get_provider(&self.embedder)
    }

    pub fn generator(&self) -> Result<DynGenerator, SeferError> {
        match self.providers.generator.list_provider_ids().first() {
            Some(id) => self.providers.generator.get_provider(id),
            None => err!(InvalidProvider, "no answer generator configured; set OPENAI_KEY"),
        }
    }

    pub fn index_service(
        &self,
        source: &str,
        chunking: ChunkConfig,
        options: BuildOptions,
    ) -> Result<IndexService, SeferError> {
        let source = self.providers.source.get_provider(source)?;
        Ok(IndexService::new(source, self.embedder()?)
            .with_chunking(chunking)
            .with_build_options(options))
    }

    /// Open the index at `path` with the embedder recorded in its manifest.
    pub async fn query_service(&self, path: impl AsRef<Path>) -> Result<QueryService, SeferError> {
        let index = VectorIndex::load(path).await?;
        let provider = &index.manifest().provider;

        let embedder = match self.providers.embedding.get_provider(provider) {
            Ok(embedder) => embedder,
            Err(_) => {
                return err!(
                    InvalidProvider,
                    "index was built with '{provider}', which is not available; pass `--embedder {provider}` or set EMBEDDER={provider}"
                )
            }
        };
        let retriever = Retriever::new(index, embedder)?;
        Ok(QueryService::new(retriever, self.generator()?))
    }

    #[cfg(test)]
    pub fn new_test(providers: AppProviderState, embedder: &str) -> Self {
        Self {
            providers,
            embedder: embedder.to_string(),
        }
    }
}

/// Provider factories for every capability.
#[derive(Clone)]
pub struct AppProviderState {
    pub embedding: Arc<EmbeddingProvider>,
    pub generator: Arc<GeneratorProvider>,
    pub source: Arc<TextSourceProvider>,
}

/// Creates and implements functions for `$target` to easily get an instance of whatever
/// the provider is for, i.e. `$provider_out`.
macro_rules! provider {
    (
        $( $target:ident -> $provider_out:ident ),+
    ) => {
        $(
            #[derive(Clone, Default)]
            pub struct $target {
                providers: HashMap<&'static str, Arc<dyn $provider_out + Send + Sync>>,
            }

            impl ProviderFactory<Arc<dyn $provider_out + Send + Sync>> for $target {
                /// AUTO-GENERATED BY THE `provider!` MACRO.
                /// SEE [crate::app::state] FOR MORE DETAILS.
                /// Obtain the provider registered under `input`.
                fn get_provider(
                    &self,
                    input: &str,
                ) -> Result<Arc<dyn $provider_out + Send + Sync>, SeferError> {
                    match self.providers.get(input).cloned() {
                        Some(e) => Ok(e),
                        None => err!(InvalidProvider, "{input}"),
                    }
                }

                /// AUTO-GENERATED BY THE `provider!` MACRO.
                /// SEE [crate::app::state] FOR MORE DETAILS.
                /// A list of available providers for a given functionality.
                fn list_provider_ids(&self) -> Vec<&'static str> {
                    let mut ids = self.providers.keys().cloned().collect::<Vec<_>>();
                    ids.sort();
                    ids
                }

                /// AUTO-GENERATED BY THE `provider!` MACRO.
                /// SEE [crate::app::state] FOR MORE DETAILS.
                /// Register a new provider in this factory.
                fn register(
                    &mut self,
                    id: &'static str,
                    provider: Arc<dyn $provider_out + Send + Sync>,
                ) {
                    self.providers.insert(id, provider);
                }
            }
        )+
    };
}

provider! {
    EmbeddingProvider -> Embedder,
    GeneratorProvider -> AnswerGenerator,
    TextSourceProvider -> TextSource
}
