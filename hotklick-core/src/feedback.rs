//! Timed visual feedback: the highlight blink after a wrong answer and the
//! inline reveal box used in practice mode.

use std::ops::Range;
use std::time::Duration;

use crate::clock::Timer;
use crate::model::{Region, RegionId};
use crate::settings::FeedbackSettings;

/// Shown when a practiced region has no text
pub const NO_TEXT_PLACEHOLDER: &str = "This region has no text";

/// Phase of an active highlight, as seen by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightState {
    pub region: RegionId,
    /// Highlighted frame when true, normal frame when false
    pub on: bool,
}

#[derive(Debug, Clone)]
struct Blink {
    region: RegionId,
    ticks: u32,
    timer: Timer,
}

/// Blinks a region on and off on a fixed interval for a fixed number of
/// cycles, then returns to the normal frame.
///
/// Once started a blink always runs to completion; the only thing that stops
/// it early is a newer blink taking its place.
#[derive(Debug, Clone)]
pub struct HighlightFeedback {
    interval: Duration,
    total_ticks: u32,
    active: Option<Blink>,
}

impl HighlightFeedback {
    pub fn new(settings: &FeedbackSettings) -> Self {
        Self {
            interval: settings.blink_interval(),
            total_ticks: settings.blink_cycles * 2,
            active: None,
        }
    }

    pub fn start(&mut self, region: RegionId, now: Duration) {
        if self.active.is_some() {
            tracing::debug!("highlight restarted before the previous one finished");
        }
        let mut timer = Timer::idle();
        timer.start(now, self.interval);
        self.active = Some(Blink {
            region,
            ticks: 0,
            timer,
        });
    }

    /// Advance the blink; returns true when the frame changed
    pub fn tick(&mut self, now: Duration) -> bool {
        let Some(blink) = self.active.as_mut() else {
            return false;
        };

        let mut changed = false;
        while let Some(fired_at) = blink.timer.fire(now) {
            blink.ticks += 1;
            changed = true;
            if blink.ticks >= self.total_ticks {
                self.active = None;
                tracing::debug!("highlight finished");
                return true;
            }
            // Schedule from the previous deadline so late polls don't drift
            blink.timer.start_at(fired_at + self.interval);
        }
        changed
    }

    pub fn state(&self) -> Option<HighlightState> {
        self.active.as_ref().map(|b| HighlightState {
            region: b.region,
            on: b.ticks % 2 == 1,
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.active.as_ref().and_then(|b| b.timer.deadline())
    }
}

/// A link found in revealed text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Byte range within the text
    pub range: Range<usize>,
    pub href: String,
}

/// Find `http://`, `https://` and `www.` links, split on whitespace
pub fn find_links(text: &str) -> Vec<Link> {
    let mut links = Vec::new();
    let mut start = None;

    for (i, c) in text.char_indices().chain(std::iter::once((text.len(), ' '))) {
        match (c.is_whitespace(), start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                let word = &text[s..i];
                let href = if word.starts_with("http://") || word.starts_with("https://") {
                    Some(word.to_string())
                } else if word.starts_with("www.") {
                    Some(format!("https://{word}"))
                } else {
                    None
                };
                if let Some(href) = href {
                    links.push(Link { range: s..i, href });
                }
                start = None;
            }
            _ => {}
        }
    }

    links
}

/// Content of the practice reveal box
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revealed {
    Text {
        region: RegionId,
        text: String,
        links: Vec<Link>,
    },
    Placeholder {
        region: RegionId,
    },
}

impl Revealed {
    pub fn message(&self) -> &str {
        match self {
            Revealed::Text { text, .. } => text,
            Revealed::Placeholder { .. } => NO_TEXT_PLACEHOLDER,
        }
    }
}

/// Inline text box for practice mode. Text stays until closed; the
/// placeholder hides itself after a delay.
#[derive(Debug, Clone)]
pub struct RevealBox {
    hide_after: Duration,
    content: Option<Revealed>,
    hide_timer: Timer,
}

impl RevealBox {
    pub fn new(settings: &FeedbackSettings) -> Self {
        Self {
            hide_after: settings.placeholder_hide(),
            content: None,
            hide_timer: Timer::idle(),
        }
    }

    /// Show the region's text, or the placeholder when it has none
    pub fn show(&mut self, region: &Region, now: Duration) {
        match region.text() {
            Some(text) => {
                self.content = Some(Revealed::Text {
                    region: region.id,
                    text: text.to_string(),
                    links: find_links(text),
                });
                self.hide_timer.cancel();
            }
            None => {
                self.content = Some(Revealed::Placeholder { region: region.id });
                self.hide_timer.start(now, self.hide_after);
            }
        }
    }

    pub fn close(&mut self) {
        self.content = None;
        self.hide_timer.cancel();
    }

    /// Hide an expired placeholder; returns true when something changed
    pub fn tick(&mut self, now: Duration) -> bool {
        if self.hide_timer.fire(now).is_none() {
            return false;
        }
        if matches!(self.content, Some(Revealed::Placeholder { .. })) {
            self.content = None;
            return true;
        }
        false
    }

    pub fn content(&self) -> Option<&Revealed> {
        self.content.as_ref()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.hide_timer.deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Point, RegionPatch};
    use crate::region_index::RegionIndex;
    use crate::settings::RadiusSettings;
    use uuid::Uuid;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    // ============= Highlight =============

    #[test]
    fn test_highlight_blinks_three_cycles() {
        let mut hl = HighlightFeedback::new(&FeedbackSettings::default());
        let region = Uuid::new_v4();
        hl.start(region, ms(1000));
        assert_eq!(hl.state(), Some(HighlightState { region, on: false }));

        let mut frames = Vec::new();
        for t in (1000..=3000).step_by(50) {
            if hl.tick(ms(t)) {
                frames.push((t, hl.state().map(|s| s.on)));
            }
        }

        assert_eq!(
            frames,
            vec![
                (1250, Some(true)),
                (1500, Some(false)),
                (1750, Some(true)),
                (2000, Some(false)),
                (2250, Some(true)),
                (2500, None),
            ]
        );
        assert!(!hl.is_active());
        assert_eq!(hl.next_deadline(), None);
    }

    #[test]
    fn test_late_poll_catches_up_to_normal_frame() {
        let mut hl = HighlightFeedback::new(&FeedbackSettings::default());
        hl.start(Uuid::new_v4(), ms(0));
        hl.tick(ms(260));
        assert_eq!(hl.state().map(|s| s.on), Some(true));

        assert!(hl.tick(ms(5000)));
        assert_eq!(hl.state(), None);
    }

    #[test]
    fn test_idle_highlight_does_nothing() {
        let mut hl = HighlightFeedback::new(&FeedbackSettings::default());
        assert!(!hl.tick(ms(100)));
        assert_eq!(hl.state(), None);
    }

    // ============= Links =============

    #[test]
    fn test_find_links() {
        let text = "See https://example.org/a and www.rust-lang.org now";
        let links = find_links(text);
        assert_eq!(links.len(), 2);
        assert_eq!(&text[links[0].range.clone()], "https://example.org/a");
        assert_eq!(links[0].href, "https://example.org/a");
        assert_eq!(&text[links[1].range.clone()], "www.rust-lang.org");
        assert_eq!(links[1].href, "https://www.rust-lang.org");
    }

    #[test]
    fn test_find_links_at_end_and_none() {
        assert_eq!(find_links("plain words only"), vec![]);
        let links = find_links("http://a.b");
        assert_eq!(links[0].range, 0..10);
    }

    // ============= Reveal =============

    fn region_with_text(text: Option<&str>) -> Region {
        let mut idx = RegionIndex::new(Uuid::new_v4(), RadiusSettings::default());
        let id = idx.create(Point::new(0.0, 0.0), 20, None).unwrap().id;
        if let Some(text) = text {
            idx.update(id, RegionPatch::text(text)).unwrap();
        }
        idx.get(id).unwrap().clone()
    }

    #[test]
    fn test_text_stays_until_closed() {
        let mut reveal = RevealBox::new(&FeedbackSettings::default());
        let region = region_with_text(Some("Left ventricle"));
        reveal.show(&region, ms(0));

        assert!(!reveal.tick(ms(10_000)));
        assert_eq!(reveal.content().unwrap().message(), "Left ventricle");

        reveal.close();
        assert!(reveal.content().is_none());
    }

    #[test]
    fn test_placeholder_hides_after_delay() {
        let mut reveal = RevealBox::new(&FeedbackSettings::default());
        let region = region_with_text(None);
        reveal.show(&region, ms(100));
        assert_eq!(reveal.content().unwrap().message(), NO_TEXT_PLACEHOLDER);

        assert!(!reveal.tick(ms(2099)));
        assert!(reveal.tick(ms(2100)));
        assert!(reveal.content().is_none());
    }

    #[test]
    fn test_text_replacing_placeholder_is_not_hidden() {
        let mut reveal = RevealBox::new(&FeedbackSettings::default());
        reveal.show(&region_with_text(None), ms(0));
        reveal.show(&region_with_text(Some("Aorta")), ms(500));

        assert!(!reveal.tick(ms(3000)));
        assert_eq!(reveal.content().unwrap().message(), "Aorta");
    }
}
