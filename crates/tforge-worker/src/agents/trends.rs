use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use tforge_clients::{InterestFeed, PopularVideoFeed, PostSearch};
use tforge_models::{TrendBundle, TrendSource, GOOGLE_TRENDS, X_TRENDS, YOUTUBE_TRENDS};
use tforge_store::TrendSourceStore;

use super::{Stage, StageAgent};
use crate::error::StageResult;

/// Collects raw trend signals for a niche from every configured source.
pub struct TrendAgent {
    sources: TrendSourceStore,
    interest: Arc<dyn InterestFeed>,
    videos: Arc<dyn PopularVideoFeed>,
    posts: Arc<dyn PostSearch>,
}

impl TrendAgent {
    pub fn new(
        sources: TrendSourceStore,
        interest: Arc<dyn InterestFeed>,
        videos: Arc<dyn PopularVideoFeed>,
        posts: Arc<dyn PostSearch>,
    ) -> Self {
        Self {
            sources,
            interest,
            videos,
            posts,
        }
    }

    async fn load_sources(&self) -> StageResult<Vec<TrendSource>> {
        let store = self.sources.clone();
        Ok(tokio::task::spawn_blocking(move || store.list()).await??)
    }
}

#[async_trait]
impl StageAgent for TrendAgent {
    type Input = String;
    type Output = TrendBundle;

    fn stage(&self) -> Stage {
        Stage::Trends
    }

    async fn run(&self, niche: String) -> StageResult<TrendBundle> {
        let mut bundle = TrendBundle::new(niche.as_str());

        for source in self.load_sources().await? {
            let key = source.api_key.as_deref();
            debug!(source = %source.name, "Querying trend source");

            match source.name.as_str() {
                GOOGLE_TRENDS => bundle.google.extend(self.interest.interest(&niche, key).await?),
                YOUTUBE_TRENDS => bundle.youtube.extend(self.videos.popular_titles(key).await?),
                X_TRENDS => bundle.x.extend(self.posts.search(&niche, key).await?),
                other => bundle.other.push(format!("{} trend for {}", other, niche)),
            }
        }

        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tforge_clients::ClientResult;

    /// Returns a fixed series and remembers the key it was handed.
    #[derive(Default)]
    struct RecordingInterest(Mutex<Vec<Option<String>>>);

    #[async_trait]
    impl InterestFeed for RecordingInterest {
        async fn interest(&self, _term: &str, credential: Option<&str>) -> ClientResult<Vec<f64>> {
            self.0.lock().unwrap().push(credential.map(str::to_string));
            Ok(vec![40.0, 75.0])
        }
    }

    struct NoVideos;

    #[async_trait]
    impl PopularVideoFeed for NoVideos {
        async fn popular_titles(&self, _credential: Option<&str>) -> ClientResult<Vec<String>> {
            panic!("no YouTube row is configured");
        }
    }

    #[derive(Default)]
    struct RecordingPosts(Mutex<Vec<(String, Option<String>)>>);

    #[async_trait]
    impl PostSearch for RecordingPosts {
        fn name(&self) -> &str {
            "x"
        }

        async fn search(&self, query: &str, credential: Option<&str>) -> ClientResult<Vec<String>> {
            self.0
                .lock()
                .unwrap()
                .push((query.to_string(), credential.map(str::to_string)));
            Ok(vec![format!("{} launch window opens", query)])
        }
    }

    #[tokio::test]
    async fn test_each_row_goes_to_its_integration_with_its_key() {
        let store = TrendSourceStore::open_in_memory().unwrap();
        store
            .upsert(&TrendSource::new(GOOGLE_TRENDS, "https://trends.google.com"))
            .unwrap();
        store
            .upsert(&TrendSource::new(X_TRENDS, "https://x.com").with_api_key(Some("bearer".to_string())))
            .unwrap();
        store
            .upsert(&TrendSource::new("Hacker News", "https://news.ycombinator.com"))
            .unwrap();

        let interest = Arc::new(RecordingInterest::default());
        let posts = Arc::new(RecordingPosts::default());
        let agent = TrendAgent::new(store, interest.clone(), Arc::new(NoVideos), posts.clone());

        let bundle = agent.run("mars".to_string()).await.unwrap();

        assert_eq!(bundle.google, vec![40.0, 75.0]);
        assert_eq!(bundle.x, vec!["mars launch window opens"]);
        assert!(bundle.youtube.is_empty());
        assert_eq!(bundle.other, vec!["Hacker News trend for mars"]);

        assert_eq!(*interest.0.lock().unwrap(), vec![None]);
        assert_eq!(
            *posts.0.lock().unwrap(),
            vec![("mars".to_string(), Some("bearer".to_string()))]
        );
    }
}
