//! One carousel instance: collected slides, navigation, frame ratio and
//! lightbox, driven by [`WidgetEvent`]s.
//!
//! Navigation and the lightbox never keep separate copies of the current
//! index. [`Carousel::go_to`] is the only way the index changes, and it is
//! also what refreshes an open lightbox, so the overlay can never show a
//! different slide than the carousel.
//!
//! Frame sizing goes through [`Carousel::refresh_layout`], which is safe to
//! call from any completion path: it recomputes the applied ratio from the
//! tracker and writes it to every frame and the control layer.

use crate::collect::{self, CollectContext, MediaHandle, MediaKind, SlideRecord};
use crate::config::{ControlsConfig, SlideshowConfig};
use crate::dom::{Document, NodeId};
use crate::lightbox::{Lightbox, PointerTarget};
use crate::navigation::{Navigation, PlayerCommand, PlayerMessage, SlideView};
use crate::probe::Dimensions;
use crate::ratio::{self, RatioTracker};
use maud::Markup;
use tracing::{debug, warn};

/// Keys the widget reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Other(String),
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Key::Escape,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            other => Key::Other(other.to_string()),
        }
    }
}

/// Input delivered to a carousel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    /// Previous arrow in the control layer.
    Previous,
    /// Next arrow in the control layer.
    Next,
    /// A position indicator.
    Indicator(usize),
    /// Pointer activation of a slide's frame.
    FrameActivated(usize),
    /// An image finished loading with this natural size.
    ImageLoaded { slide: usize, width: u32, height: u32 },
    LightboxClose,
    LightboxPrevious,
    LightboxNext,
    /// Pointer press somewhere on the overlay.
    LightboxPointer(PointerTarget),
    Key(Key),
}

#[derive(Debug, Clone)]
pub struct Carousel {
    instance: usize,
    navigation: Navigation,
    ratio: RatioTracker,
    /// Ratio last written to frames and the control layer.
    frame_ratio: f64,
    lightbox: Option<Lightbox>,
    controls: ControlsConfig,
    outbox: Vec<PlayerMessage>,
}

impl Carousel {
    /// Collect a container's media and build a carousel over it.
    ///
    /// Returns `None` when the container holds no usable media.
    pub fn build(
        doc: &Document,
        container: NodeId,
        ctx: &CollectContext<'_>,
        instance: usize,
    ) -> Option<Self> {
        let records = collect::collect_slides(doc, container, ctx);
        let attribute = &ctx.config.markup.ratio_attribute;
        let override_ratio = doc.attr(container, attribute).and_then(|value| {
            let parsed = ratio::parse_ratio_override(&value);
            if parsed.is_none() {
                warn!(value = %value, "ignoring unusable {attribute}");
            }
            parsed
        });
        Self::from_records(records, override_ratio, ctx.config, instance)
    }

    /// Build from already-collected records.
    pub fn from_records(
        records: Vec<SlideRecord>,
        override_ratio: Option<f64>,
        config: &SlideshowConfig,
        instance: usize,
    ) -> Option<Self> {
        let mut tracker = RatioTracker::new(override_ratio, config.video.default_ratio());
        for record in &records {
            tracker.observe(record.ratio);
        }
        let navigation = Navigation::new(records, config.controls.indicators)?;
        let mut carousel = Self {
            instance,
            navigation,
            ratio: tracker,
            frame_ratio: 0.0,
            lightbox: config.controls.lightbox.then(Lightbox::new),
            controls: config.controls.clone(),
            outbox: Vec::new(),
        };
        carousel.refresh_layout();
        Some(carousel)
    }

    pub fn instance(&self) -> usize {
        self.instance
    }

    pub fn len(&self) -> usize {
        self.navigation.len()
    }

    /// Always false: a carousel is never built without slides.
    pub fn is_empty(&self) -> bool {
        self.navigation.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.navigation.current()
    }

    pub fn slides(&self) -> &[SlideView] {
        self.navigation.views()
    }

    pub fn indicator(&self) -> Option<usize> {
        self.navigation.indicator()
    }

    pub fn controls(&self) -> &ControlsConfig {
        &self.controls
    }

    pub fn max_ratio(&self) -> f64 {
        self.ratio.max_ratio()
    }

    pub fn override_ratio(&self) -> Option<f64> {
        self.ratio.override_ratio()
    }

    /// Ratio currently applied to frames and the control layer.
    pub fn frame_ratio(&self) -> f64 {
        self.frame_ratio
    }

    pub fn lightbox(&self) -> Option<&Lightbox> {
        self.lightbox.as_ref()
    }

    pub fn lightbox_open(&self) -> bool {
        self.lightbox.as_ref().is_some_and(Lightbox::is_open)
    }

    /// Image slides whose ratio is still undetermined, as `(slide, src)`.
    pub fn pending_images(&self) -> Vec<(usize, String)> {
        self.slides()
            .iter()
            .enumerate()
            .filter(|(_, view)| view.record.is_deferred())
            .filter_map(|(i, view)| match &view.record.handle {
                MediaHandle::Image(image) => Some((i, image.src.clone())),
                MediaHandle::Video(_) => None,
            })
            .collect()
    }

    /// Messages for embedded players queued since the last call.
    pub fn take_player_messages(&mut self) -> Vec<PlayerMessage> {
        std::mem::take(&mut self.outbox)
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Show slide `target`, wrapped into range.
    pub fn go_to(&mut self, target: i64) {
        let step = self.navigation.go_to(target);
        if step.left_kind == MediaKind::Video {
            self.pause_video(step.left);
        }
        if let Some(lightbox) = self.lightbox.as_mut()
            && lightbox.is_open()
        {
            lightbox.populate(&self.navigation.current_view().record);
        }
    }

    pub fn next(&mut self) {
        self.go_to(self.current_index() as i64 + 1);
    }

    pub fn previous(&mut self) {
        self.go_to(self.current_index() as i64 - 1);
    }

    fn pause_video(&mut self, slide: usize) {
        if let Some(MediaHandle::Video(video)) =
            self.slides().get(slide).map(|view| &view.record.handle)
        {
            let message = PlayerMessage {
                slide,
                target: video.embed_src.clone(),
                payload: PlayerCommand::pause().to_json(),
            };
            self.outbox.push(message);
        }
    }

    // ------------------------------------------------------------------------
    // Lightbox
    // ------------------------------------------------------------------------

    /// Open the overlay on the current slide. No-op without a lightbox.
    pub fn open_lightbox(&mut self) {
        let current = &self.navigation.current_view().record;
        if let Some(lightbox) = self.lightbox.as_mut() {
            lightbox.open(current);
        }
    }

    /// Close the overlay. Closing a closed overlay changes nothing.
    pub fn close_lightbox(&mut self) -> bool {
        self.lightbox.as_mut().is_some_and(Lightbox::close)
    }

    // ------------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------------

    /// Record a finished image load and refresh the layout if it widened
    /// the frame.
    pub fn image_loaded(&mut self, slide: usize, natural: Dimensions) {
        let Some(record) = self.navigation.record_mut(slide) else {
            debug!(slide, "load reported for unknown slide");
            return;
        };
        let MediaHandle::Image(image) = &record.handle else {
            return;
        };
        let resolved = collect::loaded_image_ratio(image, natural);
        if resolved <= 0.0 {
            return;
        }
        record.ratio = resolved;
        if self.ratio.observe(resolved) {
            self.refresh_layout();
        }
    }

    /// Recompute the applied ratio and write it to every frame.
    pub fn refresh_layout(&mut self) {
        self.frame_ratio = self.ratio.applied();
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    /// Dispatch one input event.
    pub fn handle(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::Previous if self.controls.arrows => self.previous(),
            WidgetEvent::Next if self.controls.arrows => self.next(),
            WidgetEvent::Indicator(i) if self.indicator().is_some() => self.go_to(i as i64),
            WidgetEvent::FrameActivated(i) => {
                let view = self.navigation.current_view();
                if i == self.current_index() && view.record.kind() == MediaKind::Image {
                    self.open_lightbox();
                }
            }
            WidgetEvent::ImageLoaded {
                slide,
                width,
                height,
            } => self.image_loaded(slide, Dimensions::new(width, height)),
            WidgetEvent::LightboxClose => {
                self.close_lightbox();
            }
            WidgetEvent::LightboxPrevious if self.lightbox_open() => self.previous(),
            WidgetEvent::LightboxNext if self.lightbox_open() => self.next(),
            WidgetEvent::LightboxPointer(PointerTarget::Background) => {
                self.close_lightbox();
            }
            WidgetEvent::Key(key) if self.lightbox_open() => match key {
                Key::Escape => {
                    self.close_lightbox();
                }
                Key::ArrowLeft => self.previous(),
                Key::ArrowRight => self.next(),
                Key::Other(_) => {}
            },
            other => debug!(?other, "event ignored"),
        }
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// In-place structure replacing the container's original children.
    pub fn render(&self) -> Markup {
        crate::render::render_carousel(self)
    }

    /// Overlay markup, `None` when the lightbox is not attached.
    pub fn render_lightbox(&self) -> Option<Markup> {
        crate::render::render_lightbox(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn carousel(records: Vec<SlideRecord>) -> Carousel {
        Carousel::from_records(records, None, &SlideshowConfig::default(), 0).unwrap()
    }

    fn assert_lightbox_matches_current(c: &Carousel) {
        let lb = c.lightbox().unwrap();
        let current = &c.slides()[c.current_index()].record;
        match &current.handle {
            MediaHandle::Image(image) => {
                assert!(lb.image().visible);
                assert_eq!(lb.image().src, image.src);
                assert!(!lb.video().visible);
            }
            MediaHandle::Video(video) => {
                assert!(lb.video().visible);
                assert!(lb.video().src.starts_with(&video.embed_src));
                assert!(!lb.image().visible);
            }
        }
        assert_eq!(lb.caption(), current.caption);
    }

    #[test]
    fn empty_records_build_no_carousel() {
        assert!(Carousel::from_records(vec![], None, &SlideshowConfig::default(), 0).is_none());
    }

    #[test]
    fn scenario_three_images_wrap_forward() {
        let mut c = carousel(image_records(3));
        assert_eq!(c.current_index(), 0);
        c.next();
        c.next();
        assert_eq!(c.current_index(), 2);
        assert!(c.slides()[2].is_active());
        c.next();
        assert_eq!(c.current_index(), 0);
        assert!(c.slides()[0].is_active());
    }

    #[test]
    fn previous_from_first_wraps_to_last() {
        let mut c = carousel(image_records(3));
        c.previous();
        assert_eq!(c.current_index(), 2);
    }

    #[test]
    fn go_to_wraps_all_integers() {
        for n in 1..=5 {
            let mut c = carousel(image_records(n));
            for k in -11i64..=11 {
                c.go_to(k);
                assert_eq!(c.current_index(), (((k % n as i64) + n as i64) % n as i64) as usize);
                let active = c.slides().iter().filter(|v| v.is_active()).count();
                assert_eq!(active, 1);
            }
        }
    }

    #[test]
    fn scenario_scaled_image_drives_ratio() {
        let mut record = image_record("a.png");
        record.ratio = 0.0;
        if let MediaHandle::Image(image) = &mut record.handle {
            image.scale = Some(0.5);
        }
        let mut c = carousel(vec![record]);
        assert_eq!(c.frame_ratio(), 16.0 / 9.0);
        c.handle(WidgetEvent::ImageLoaded {
            slide: 0,
            width: 1000,
            height: 500,
        });
        assert_eq!(c.max_ratio(), 4.0);
        assert_eq!(c.frame_ratio(), 4.0);
        assert!(c.pending_images().is_empty());
    }

    #[test]
    fn narrower_late_load_keeps_frame() {
        let mut records = image_records(2);
        records[0].ratio = 2.0;
        records[1].ratio = 0.0;
        let mut c = carousel(records);
        assert_eq!(c.frame_ratio(), 2.0);
        c.image_loaded(1, Dimensions::new(100, 100));
        assert_eq!(c.max_ratio(), 2.0);
        assert_eq!(c.frame_ratio(), 2.0);
        assert_eq!(c.slides()[1].record.ratio, 1.0);
    }

    #[test]
    fn max_ratio_monotonic_over_load_orders() {
        let sizes = [(400, 300), (1600, 900), (300, 400), (2000, 500)];
        let orders = [[0, 1, 2, 3], [3, 2, 1, 0], [2, 0, 3, 1], [1, 3, 0, 2]];
        for order in orders {
            let mut records = image_records(4);
            for r in &mut records {
                r.ratio = 0.0;
            }
            let mut c = carousel(records);
            let mut previous = c.max_ratio();
            for slide in order {
                let (w, h) = sizes[slide];
                c.image_loaded(slide, Dimensions::new(w, h));
                assert!(c.max_ratio() >= previous);
                previous = c.max_ratio();
            }
            assert_eq!(c.max_ratio(), 4.0);
        }
    }

    #[test]
    fn override_ratio_wins() {
        let c = Carousel::from_records(image_records(2), Some(1.0), &SlideshowConfig::default(), 0)
            .unwrap();
        assert_eq!(c.frame_ratio(), 1.0);
    }

    #[test]
    fn load_for_video_or_unknown_slide_is_ignored() {
        let mut c = carousel(vec![video_record("v")]);
        c.image_loaded(0, Dimensions::new(4000, 100));
        c.image_loaded(9, Dimensions::new(4000, 100));
        assert_eq!(c.max_ratio(), 16.0 / 9.0);
    }

    #[test]
    fn leaving_video_queues_pause() {
        let mut c = carousel(vec![video_record("v"), image_record("a.png")]);
        c.next();
        let messages = c.take_player_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].slide, 0);
        assert_eq!(
            messages[0].payload,
            r#"{"event":"command","func":"pauseVideo","args":""}"#
        );
        c.next();
        assert!(c.take_player_messages().is_empty());
    }

    #[test]
    fn scenario_open_on_video_shows_video_element() {
        let mut c = carousel(vec![image_record("a.png"), video_record("vid")]);
        c.next();
        c.open_lightbox();
        let lb = c.lightbox().unwrap();
        assert!(lb.is_open());
        assert!(lb.video().visible);
        assert!(!lb.image().visible);
        assert_eq!(lb.image().src, "");
    }

    #[test]
    fn scenario_dismiss_key() {
        let mut c = carousel(vec![video_record("vid"), image_record("a.png")]);
        let before = c.clone().lightbox().cloned();
        c.handle(WidgetEvent::Key(Key::Escape));
        assert!(!c.lightbox_open());
        assert_eq!(c.lightbox().cloned(), before);
        assert_eq!(c.current_index(), 0);

        c.open_lightbox();
        assert!(!c.lightbox().unwrap().video().src.is_empty());
        c.handle(WidgetEvent::Key(Key::Escape));
        assert!(!c.lightbox_open());
        assert_eq!(c.lightbox().unwrap().video().src, "");
    }

    #[test]
    fn lightbox_follows_every_navigation() {
        let mut records = vec![
            image_record("a.png"),
            video_record("v1"),
            image_record("b.png"),
        ];
        records[2].caption = "<p>third</p>".into();
        let mut c = carousel(records);
        c.handle(WidgetEvent::FrameActivated(0));
        assert!(c.lightbox_open());
        assert_lightbox_matches_current(&c);

        let events = [
            WidgetEvent::LightboxNext,
            WidgetEvent::Key(Key::ArrowRight),
            WidgetEvent::LightboxPrevious,
            WidgetEvent::Key(Key::ArrowLeft),
            WidgetEvent::Indicator(2),
            WidgetEvent::Next,
            WidgetEvent::Previous,
        ];
        for event in events {
            c.handle(event);
            assert_lightbox_matches_current(&c);
        }
    }

    #[test]
    fn arrow_keys_ignored_while_closed() {
        let mut c = carousel(image_records(3));
        c.handle(WidgetEvent::Key(Key::ArrowRight));
        c.handle(WidgetEvent::LightboxNext);
        assert_eq!(c.current_index(), 0);
    }

    #[test]
    fn video_frame_does_not_open_lightbox() {
        let mut c = carousel(vec![video_record("v"), image_record("a.png")]);
        c.handle(WidgetEvent::FrameActivated(0));
        assert!(!c.lightbox_open());
    }

    #[test]
    fn hidden_frame_does_not_open_lightbox() {
        let mut c = carousel(image_records(2));
        c.handle(WidgetEvent::FrameActivated(1));
        assert!(!c.lightbox_open());
    }

    #[test]
    fn pointer_on_content_keeps_lightbox_open() {
        let mut c = carousel(image_records(2));
        c.handle(WidgetEvent::FrameActivated(0));
        c.handle(WidgetEvent::LightboxPointer(PointerTarget::Content));
        assert!(c.lightbox_open());
        c.handle(WidgetEvent::LightboxPointer(PointerTarget::Background));
        assert!(!c.lightbox_open());
    }

    #[test]
    fn close_control_closes() {
        let mut c = carousel(image_records(2));
        c.open_lightbox();
        c.handle(WidgetEvent::LightboxClose);
        assert!(!c.lightbox_open());
        assert!(!c.close_lightbox());
    }

    #[test]
    fn disabled_controls_ignore_their_events() {
        let mut config = SlideshowConfig::default();
        config.controls.arrows = false;
        config.controls.indicators = false;
        config.controls.lightbox = false;
        let mut c = Carousel::from_records(image_records(3), None, &config, 0).unwrap();
        c.handle(WidgetEvent::Next);
        c.handle(WidgetEvent::Indicator(2));
        c.handle(WidgetEvent::FrameActivated(0));
        assert_eq!(c.current_index(), 0);
        assert!(c.lightbox().is_none());
        assert!(!c.lightbox_open());
        c.go_to(1);
        assert_eq!(c.current_index(), 1);
    }

    #[test]
    fn key_names() {
        assert_eq!(Key::from_name("Escape"), Key::Escape);
        assert_eq!(Key::from_name("ArrowLeft"), Key::ArrowLeft);
        assert_eq!(Key::from_name("ArrowRight"), Key::ArrowRight);
        assert_eq!(Key::from_name("a"), Key::Other("a".into()));
    }
}
