//! Wiring of stage-agents and their collaborators.

use std::sync::Arc;

use tracing::info;

use tforge_clients::{
    ChatModel, ClientError, ClientResult, HfClassifier, HfTextToImage, ImageModel, InterestFeed,
    OpenAiChat, OpenAiImages, OpenAiSpeech, PopularVideoFeed, PostSearch, RedditSearch,
    SerpApiTrends, SpeechModel, TextClassifier, XRecentSearch, YoutubeCharts, SERPAPI_KEY_VAR,
    X_KEY_VAR, YOUTUBE_KEY_VAR,
};
use tforge_media::{FfmpegCompositor, VideoCompositor};
use tforge_models::{
    InteractionBundle, MediaArtifact, Sentiment, TrendBundle, TrendSource, GOOGLE_TRENDS, X_TRENDS,
    YOUTUBE_TRENDS,
};
use tforge_store::TrendSourceStore;

use crate::agents::{
    BoxedAgent, ClassifierStyleRanker, ImageAgent, ImageInput, ImageSet, InteractionAgent,
    MetadataAgent, MetadataInput, MetadataOutput, NarrationAgent, NarrationInput, ScriptAgent,
    ScriptInput, SentimentAgent, StageAgent, StyleRanker, TopicAgent, TrendAgent, VideoAgent,
    VideoInput,
};
use crate::artifacts::ArtifactArea;
use crate::config::AgentConfig;
use crate::error::WorkerResult;

/// External services the agents depend on.
#[derive(Clone)]
pub struct Collaborators {
    pub chat: Arc<dyn ChatModel>,
    pub thumbnails: Arc<dyn ImageModel>,
    pub backgrounds: Arc<dyn ImageModel>,
    pub speech: Arc<dyn SpeechModel>,
    pub classifier: Arc<dyn TextClassifier>,
    pub style_ranker: Arc<dyn StyleRanker>,
    pub interest: Arc<dyn InterestFeed>,
    pub videos: Arc<dyn PopularVideoFeed>,
    /// Backs the "X Trends" source
    pub trend_posts: Arc<dyn PostSearch>,
    /// Every source the sentiment stage samples
    pub sentiment_posts: Vec<Arc<dyn PostSearch>>,
    pub compositor: Arc<dyn VideoCompositor>,
}

impl Collaborators {
    /// Build the production clients. Fails when a required key is missing.
    pub fn from_config(config: &AgentConfig) -> WorkerResult<Self> {
        let openai = &config.openai;
        let hf = &config.huggingface;

        let x: Arc<dyn PostSearch> = Arc::new(XRecentSearch::new(config.x.clone())?);
        let mut sentiment_posts = Vec::new();
        if config.x.api_key.is_some() {
            sentiment_posts.push(Arc::clone(&x));
        }
        sentiment_posts.push(Arc::new(RedditSearch::new(config.reddit.clone())?) as Arc<dyn PostSearch>);

        let mut compositor = FfmpegCompositor::new();
        if let Some(secs) = config.ffmpeg_timeout_secs {
            compositor = compositor.with_timeout(secs);
        }

        let style_classifier = Arc::new(HfClassifier::new(hf.clone(), &config.style_model)?);

        Ok(Self {
            chat: Arc::new(OpenAiChat::new(openai.clone(), &config.chat_model)?),
            thumbnails: Arc::new(
                OpenAiImages::new(openai.clone(), &config.image_model)?.with_size(&config.image_size),
            ),
            backgrounds: Arc::new(HfTextToImage::new(hf.clone(), &config.background_model)?),
            speech: Arc::new(OpenAiSpeech::new(openai.clone(), &config.speech_model, &config.speech_voice)?),
            classifier: Arc::new(HfClassifier::new(hf.clone(), &config.sentiment_model)?),
            style_ranker: Arc::new(ClassifierStyleRanker::new(style_classifier)),
            interest: Arc::new(SerpApiTrends::new(config.serpapi.clone())?),
            videos: Arc::new(YoutubeCharts::new(config.youtube.clone())?),
            trend_posts: x,
            sentiment_posts,
            compositor: Arc::new(compositor),
        })
    }
}

/// Fallback keys for the keyed trend integrations.
///
/// A source row may carry its own key; otherwise the configured one is used.
/// Rows routed to an integration with neither are rejected before any job runs.
#[derive(Debug, Clone, Default)]
pub struct FeedCredentials {
    pub serpapi: Option<String>,
    pub youtube: Option<String>,
    pub x: Option<String>,
}

impl FeedCredentials {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            serpapi: config.serpapi.api_key.clone(),
            youtube: config.youtube.api_key.clone(),
            x: config.x.api_key.clone(),
        }
    }

    /// Fails with the missing variable's name when `source` cannot be queried.
    pub fn check(&self, source: &TrendSource) -> ClientResult<()> {
        let (fallback, var) = match source.name.as_str() {
            GOOGLE_TRENDS => (&self.serpapi, SERPAPI_KEY_VAR),
            YOUTUBE_TRENDS => (&self.youtube, YOUTUBE_KEY_VAR),
            X_TRENDS => (&self.x, X_KEY_VAR),
            _ => return Ok(()),
        };
        let present = |key: &Option<String>| key.as_deref().is_some_and(|k| !k.is_empty());
        if present(&source.api_key) || present(fallback) {
            Ok(())
        } else {
            Err(ClientError::missing_credential(var))
        }
    }

    pub fn check_all(&self, sources: &[TrendSource]) -> ClientResult<()> {
        sources.iter().try_for_each(|source| self.check(source))
    }
}

/// One agent per stage, typed by what it consumes and produces.
pub struct AgentRegistry {
    pub trends: BoxedAgent<String, TrendBundle>,
    pub topic: BoxedAgent<TrendBundle, String>,
    pub sentiment: BoxedAgent<String, Sentiment>,
    pub script: BoxedAgent<ScriptInput, String>,
    pub images: BoxedAgent<ImageInput, ImageSet>,
    pub narration: BoxedAgent<NarrationInput, MediaArtifact>,
    pub video: BoxedAgent<VideoInput, MediaArtifact>,
    pub interaction: BoxedAgent<String, InteractionBundle>,
    pub metadata: BoxedAgent<MetadataInput, MetadataOutput>,
}

impl AgentRegistry {
    /// Production agents from configuration.
    pub fn from_config(
        config: &AgentConfig,
        sources: TrendSourceStore,
        artifacts: Arc<ArtifactArea>,
    ) -> WorkerResult<Self> {
        let collaborators = Collaborators::from_config(config)?;
        let listed = sources.list()?;
        FeedCredentials::from_config(config).check_all(&listed)?;
        info!(
            trend_sources = listed.len(),
            chat_model = %config.chat_model,
            sentiment_sources = collaborators.sentiment_posts.len(),
            "Agent registry configured"
        );
        Ok(Self::from_collaborators(collaborators, sources, artifacts))
    }

    pub fn from_collaborators(c: Collaborators, sources: TrendSourceStore, artifacts: Arc<ArtifactArea>) -> Self {
        Self {
            trends: Box::new(TrendAgent::new(sources, c.interest, c.videos, c.trend_posts)),
            topic: Box::new(TopicAgent),
            sentiment: Box::new(SentimentAgent::new(Arc::clone(&c.classifier), c.sentiment_posts)),
            script: Box::new(ScriptAgent::new(Arc::clone(&c.chat))),
            images: Box::new(ImageAgent::new(
                c.thumbnails,
                c.backgrounds,
                c.style_ranker,
                Arc::clone(&artifacts),
            )),
            narration: Box::new(NarrationAgent::new(c.speech, Arc::clone(&artifacts))),
            video: Box::new(VideoAgent::new(c.compositor, Arc::clone(&artifacts))),
            interaction: Box::new(InteractionAgent::new(c.chat)),
            metadata: Box::new(MetadataAgent::new(artifacts)),
        }
    }

    pub fn with_trends(mut self, agent: impl StageAgent<Input = String, Output = TrendBundle> + 'static) -> Self {
        self.trends = Box::new(agent);
        self
    }

    pub fn with_topic(mut self, agent: impl StageAgent<Input = TrendBundle, Output = String> + 'static) -> Self {
        self.topic = Box::new(agent);
        self
    }

    pub fn with_sentiment(mut self, agent: impl StageAgent<Input = String, Output = Sentiment> + 'static) -> Self {
        self.sentiment = Box::new(agent);
        self
    }

    pub fn with_script(mut self, agent: impl StageAgent<Input = ScriptInput, Output = String> + 'static) -> Self {
        self.script = Box::new(agent);
        self
    }

    pub fn with_images(mut self, agent: impl StageAgent<Input = ImageInput, Output = ImageSet> + 'static) -> Self {
        self.images = Box::new(agent);
        self
    }

    pub fn with_narration(
        mut self,
        agent: impl StageAgent<Input = NarrationInput, Output = MediaArtifact> + 'static,
    ) -> Self {
        self.narration = Box::new(agent);
        self
    }

    pub fn with_video(mut self, agent: impl StageAgent<Input = VideoInput, Output = MediaArtifact> + 'static) -> Self {
        self.video = Box::new(agent);
        self
    }

    pub fn with_interaction(
        mut self,
        agent: impl StageAgent<Input = String, Output = InteractionBundle> + 'static,
    ) -> Self {
        self.interaction = Box::new(agent);
        self
    }

    pub fn with_metadata(
        mut self,
        agent: impl StageAgent<Input = MetadataInput, Output = MetadataOutput> + 'static,
    ) -> Self {
        self.metadata = Box::new(agent);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkerError;

    fn keyed_config() -> AgentConfig {
        let mut config = AgentConfig::default();
        config.openai = config.openai.with_api_key("sk-test");
        config.huggingface = config.huggingface.with_api_key("hf-test");
        config
    }

    fn registry_for(config: &AgentConfig, sources: &TrendSourceStore) -> WorkerResult<AgentRegistry> {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = Arc::new(ArtifactArea::new(dir.path()).unwrap());
        AgentRegistry::from_config(config, sources.clone(), artifacts)
    }

    #[test]
    fn test_seeded_google_trends_without_serpapi_key_fails_at_wiring() {
        let sources = TrendSourceStore::open_in_memory().unwrap();
        sources.seed_defaults(None).unwrap();

        match registry_for(&keyed_config(), &sources) {
            Err(WorkerError::Client(ClientError::MissingCredential(var))) => {
                assert_eq!(var, SERPAPI_KEY_VAR)
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("wiring should fail without a SerpApi key"),
        }
    }

    #[test]
    fn test_seeded_sources_wire_once_keys_are_present() {
        let sources = TrendSourceStore::open_in_memory().unwrap();
        sources.seed_defaults(Some("yt-row-key".to_string())).unwrap();

        let mut config = keyed_config();
        config.serpapi = config.serpapi.with_api_key("serp-test");
        assert!(registry_for(&config, &sources).is_ok());
    }

    #[test]
    fn test_row_key_or_fallback_satisfies_check() {
        let x_row = TrendSource::new(X_TRENDS, "https://x.com");
        let none = FeedCredentials::default();
        match none.check(&x_row) {
            Err(ClientError::MissingCredential(var)) => assert_eq!(var, X_KEY_VAR),
            other => panic!("unexpected result: {other:?}"),
        }

        assert!(none
            .check(&x_row.clone().with_api_key(Some("bearer".to_string())))
            .is_ok());
        assert!(none
            .check(&x_row.clone().with_api_key(Some(String::new())))
            .is_err());

        let fallback = FeedCredentials {
            x: Some("bearer".to_string()),
            ..Default::default()
        };
        assert!(fallback.check(&x_row).is_ok());

        let custom = TrendSource::new("Hacker News", "https://news.ycombinator.com");
        assert!(none.check(&custom).is_ok());
    }

    #[test]
    fn test_missing_openai_key_fails_at_wiring() {
        let config = AgentConfig::default();
        let err = Collaborators::from_config(&config).err().unwrap();
        assert!(matches!(err, WorkerError::Client(ClientError::MissingCredential(_))));
    }

    #[test]
    fn test_x_only_samples_sentiment_with_token() {
        let mut config = keyed_config();

        let without = Collaborators::from_config(&config).unwrap();
        assert_eq!(without.sentiment_posts.len(), 1);
        assert_eq!(without.sentiment_posts[0].name(), "reddit");

        config.x = config.x.with_api_key("bearer");
        let with = Collaborators::from_config(&config).unwrap();
        assert_eq!(with.sentiment_posts.len(), 2);
        assert_eq!(with.sentiment_posts[0].name(), "x");
    }
}
