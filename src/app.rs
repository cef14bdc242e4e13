//! Application wiring: CLI arguments into a running page controller.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use crate::board::universe::Page;
use crate::cache::{CacheStore, FileStore};
use crate::cli::BoardArgs;
use crate::controller::PageController;
use crate::fetch::FetchClient;
use crate::relay::default_relays;
use crate::render::ConsoleSink;

pub struct Application {
    page: Page,
    controller: PageController,
    sink: ConsoleSink,
    interval: Duration,
    once: bool,
}

impl Application {
    pub fn init() -> anyhow::Result<Application> {
        let args = BoardArgs::parse();

        let page = Page::from_path(&args.page);
        let fetch = FetchClient::with_relays(
            default_relays(),
            Duration::from_millis(args.attempt_timeout_ms),
        );
        let cache = CacheStore::new(Arc::new(FileStore::new(&args.cache_dir)));

        info!(page = page.slug(), "quoteboard starting");

        Ok(Self {
            page,
            controller: PageController::new(page, fetch, cache),
            sink: ConsoleSink::new(),
            interval: Duration::from_secs(args.interval_secs),
            once: args.once,
        })
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            self.controller.run_cycle(&mut self.sink).await;
            for page in self.board_pages() {
                println!("{}", self.sink.render_board(page));
            }
            if self.once {
                return Ok(());
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// The landing page previews the crypto and index boards; every other
    /// page renders itself.
    fn board_pages(&self) -> Vec<Page> {
        match self.page {
            Page::Landing => vec![Page::Crypto, Page::Indices],
            page => vec![page],
        }
    }
}
