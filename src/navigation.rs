//! Page and chapter requests resolved into engine display commands.

use crate::engine::{DisplayTarget, EngineCommand, Rendition};
use crate::error::EngineError;
use crate::pagination::{clamp_page, middle_page};
use std::rc::Rc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    /// 1-based, clamped before use.
    Page(i64),
    Beginning,
    Middle,
    End,
}

impl PageRequest {
    pub fn resolve(self, total_pages: usize) -> usize {
        match self {
            PageRequest::Page(n) => clamp_page(n, total_pages),
            PageRequest::Beginning => 1,
            PageRequest::Middle => middle_page(total_pages),
            PageRequest::End => total_pages.max(1),
        }
    }
}

/// Which unit a page number was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageUnit {
    Locations,
    Spine,
}

/// Page the engine was asked to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLanding {
    pub page: usize,
    pub total_pages: usize,
    pub unit: PageUnit,
    pub target: DisplayTarget,
}

#[derive(Debug)]
pub struct NavigationOutcome {
    /// `None` when the request could not be resolved or displayed.
    pub landing: Option<PageLanding>,
    /// Set when this request had to build the LocationsIndex itself, whether
    /// or not the page was then displayed.
    pub index_build: Option<Result<usize, EngineError>>,
}

#[derive(Clone)]
pub struct Navigator {
    engine: Rc<dyn Rendition>,
    chunk_size: usize,
}

impl Navigator {
    pub fn new(engine: Rc<dyn Rendition>, chunk_size: usize) -> Self {
        Self {
            engine,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Display the requested page. The landing is `None` when neither the
    /// index nor the spine can resolve it or the display fails; that is
    /// logged, never raised.
    pub async fn go_to(&self, request: PageRequest) -> NavigationOutcome {
        let mut index_build = None;
        let mut index_len = self.engine.locations_len();
        if index_len == 0 {
            debug!(chunk_size = self.chunk_size, "Building locations index before navigating");
            let result = self.engine.generate_locations(self.chunk_size).await;
            match &result {
                Ok(len) => index_len = *len,
                Err(err) => warn!("Locations index unavailable, trying spine: {err}"),
            }
            index_build = Some(result);
        }

        let landing = match self
            .resolve_in_index(request, index_len)
            .or_else(|| self.resolve_in_spine(request))
        {
            Some(landing) => self.display(landing).await,
            None => {
                warn!(?request, "Page request could not be resolved");
                None
            }
        };
        NavigationOutcome {
            landing,
            index_build,
        }
    }

    async fn display(&self, landing: PageLanding) -> Option<PageLanding> {
        info!(
            page = landing.page,
            total_pages = landing.total_pages,
            unit = ?landing.unit,
            target = %landing.target,
            "Navigating"
        );
        match self
            .engine
            .issue(EngineCommand::Display(landing.target.clone()))
            .await
        {
            Ok(()) => Some(landing),
            Err(err) => {
                warn!(page = landing.page, target = %landing.target, "Display failed: {err}");
                None
            }
        }
    }

    fn resolve_in_index(&self, request: PageRequest, len: usize) -> Option<PageLanding> {
        if len == 0 {
            return None;
        }
        let page = request.resolve(len);
        let locator = self.engine.locator_at(page - 1)?;
        Some(PageLanding {
            page,
            total_pages: len,
            unit: PageUnit::Locations,
            target: DisplayTarget::Locator(locator),
        })
    }

    fn resolve_in_spine(&self, request: PageRequest) -> Option<PageLanding> {
        let spine = self.engine.spine();
        if spine.is_empty() {
            return None;
        }
        let page = request.resolve(spine.len());
        let item = spine.get(page - 1)?;
        Some(PageLanding {
            page,
            total_pages: spine.len(),
            unit: PageUnit::Spine,
            target: DisplayTarget::Section(item.href.clone()),
        })
    }

    pub async fn go_to_chapter(&self, href: &str) -> bool {
        info!(href, "Navigating to chapter");
        self.issue(EngineCommand::Display(DisplayTarget::Section(
            href.to_string(),
        )))
        .await
    }

    pub async fn next_page(&self) -> bool {
        self.issue(EngineCommand::Next).await
    }

    pub async fn prev_page(&self) -> bool {
        self.issue(EngineCommand::Prev).await
    }

    async fn issue(&self, command: EngineCommand) -> bool {
        match self.engine.issue(command.clone()).await {
            Ok(()) => true,
            Err(err) => {
                warn!(?command, "Engine command failed: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRendition;

    fn navigator(engine: &Rc<FakeRendition>) -> Navigator {
        Navigator::new(engine.clone(), 1650)
    }

    async fn page_of(nav: &Navigator, request: PageRequest) -> usize {
        nav.go_to(request).await.landing.unwrap().page
    }

    #[tokio::test]
    async fn page_requests_are_clamped_into_the_index() {
        let engine = Rc::new(FakeRendition::new(&[4, 4, 2]));
        engine.build_locations();
        let nav = navigator(&engine);

        for (requested, expected) in [(-5, 1), (0, 1), (1, 1), (7, 7), (10, 10), (99, 10)] {
            let outcome = nav.go_to(PageRequest::Page(requested)).await;
            assert!(outcome.index_build.is_none());
            let landing = outcome.landing.unwrap();
            assert_eq!(landing.page, expected);
            assert_eq!(landing.unit, PageUnit::Locations);
            assert_eq!(
                engine.displayed().last(),
                Some(&DisplayTarget::Locator(engine.locator(expected - 1)))
            );
        }
    }

    #[tokio::test]
    async fn quick_jumps_use_beginning_middle_and_end() {
        let engine = Rc::new(FakeRendition::new(&[3, 3, 3]));
        engine.build_locations();
        let nav = navigator(&engine);

        assert_eq!(page_of(&nav, PageRequest::Beginning).await, 1);
        assert_eq!(page_of(&nav, PageRequest::Middle).await, 5);
        assert_eq!(page_of(&nav, PageRequest::End).await, 9);
    }

    #[tokio::test]
    async fn missing_index_is_built_on_demand() {
        let engine = Rc::new(FakeRendition::new(&[5, 5]));
        let nav = navigator(&engine);

        let outcome = nav.go_to(PageRequest::Page(6)).await;
        assert_eq!(engine.generate_calls(), 1);
        assert!(matches!(outcome.index_build, Some(Ok(10))));
        let landing = outcome.landing.unwrap();
        assert_eq!(landing.total_pages, 10);
        assert_eq!(landing.target, DisplayTarget::Locator(engine.locator(5)));
    }

    #[tokio::test]
    async fn failed_index_falls_back_to_spine_sections() {
        let engine = Rc::new(FakeRendition::new(&[2, 2, 2]));
        engine.fail_locations();
        let nav = navigator(&engine);

        let outcome = nav.go_to(PageRequest::Page(5)).await;
        assert!(matches!(outcome.index_build, Some(Err(_))));
        let landing = outcome.landing.unwrap();
        assert_eq!(landing.unit, PageUnit::Spine);
        assert_eq!(landing.page, 3);
        assert_eq!(landing.total_pages, 3);
        assert_eq!(
            landing.target,
            DisplayTarget::Section(engine.spine()[2].href.clone())
        );
    }

    #[tokio::test]
    async fn unresolvable_request_is_a_no_op() {
        let engine = Rc::new(FakeRendition::new(&[]));
        engine.fail_locations();
        let nav = navigator(&engine);

        let outcome = nav.go_to(PageRequest::Page(3)).await;
        assert!(outcome.landing.is_none());
        assert!(matches!(outcome.index_build, Some(Err(_))));
        assert!(engine.displayed().is_empty());
    }

    #[tokio::test]
    async fn failed_display_still_reports_the_index_build() {
        let engine = Rc::new(FakeRendition::new(&[3, 3]));
        engine.fail_display();
        let nav = navigator(&engine);

        let outcome = nav.go_to(PageRequest::Page(4)).await;
        assert!(outcome.landing.is_none());
        assert!(matches!(outcome.index_build, Some(Ok(6))));
    }

    #[tokio::test]
    async fn chapter_request_displays_the_section() {
        let engine = Rc::new(FakeRendition::new(&[2, 2]));
        let nav = navigator(&engine);
        let href = engine.spine()[1].href.clone();

        assert!(nav.go_to_chapter(&href).await);
        assert_eq!(
            engine.displayed(),
            vec![DisplayTarget::Section(href.clone())]
        );
        assert_eq!(
            engine.current_location().and_then(|r| r.start.href),
            Some(href)
        );
    }
}
