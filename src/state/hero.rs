/// Landing page hero rotator
///
/// Cycles through featured titles on a timer and cross-fades between two
/// background layers. Timers are owned by the caller: every armed timer
/// carries a generation number and a fire from an older generation is
/// ignored, which is how a manual change "resets" the auto-advance.
///
/// Generations come from one counter shared by every rotator, so a timer
/// armed during an earlier visit to the landing page never matches a
/// rotator built later.
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::data::ComicSummary;

/// Time between automatic advances
pub const AUTO_ROTATE: Duration = Duration::from_secs(5);
/// Length of the crossfade between layers
pub const CROSSFADE: Duration = Duration::from_millis(600);

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// What an auto-advance timer firing led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Superseded timer, or fewer than two slides. Do not re-arm.
    Stale,
    /// A crossfade is still running; re-arm without advancing
    Rearm,
    /// Moved to the next slide; the crossfade carries this generation
    Advance(u64),
}

/// Which of the two background layers is in front
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    First,
    Second,
}

impl Layer {
    fn other(self) -> Self {
        match self {
            Layer::First => Layer::Second,
            Layer::Second => Layer::First,
        }
    }

    fn slot(self) -> usize {
        match self {
            Layer::First => 0,
            Layer::Second => 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    generation: u64,
    started: Instant,
}

#[derive(Debug, Clone)]
pub struct HeroRotator {
    slides: Vec<ComicSummary>,
    displayed: usize,
    /// Image URL held by each background layer
    layers: [Option<String>; 2],
    active: Layer,
    transition: Option<Transition>,
    /// Generation of the armed timer; 0 until the first arming
    timer_generation: u64,
}

impl HeroRotator {
    pub fn new(slides: Vec<ComicSummary>) -> Self {
        let first = slides.first().map(|slide| slide.thumbnail.clone());
        Self {
            slides,
            displayed: 0,
            layers: [first, None],
            active: Layer::First,
            transition: None,
            timer_generation: 0,
        }
    }

    pub fn slides(&self) -> &[ComicSummary] {
        &self.slides
    }

    pub fn displayed(&self) -> usize {
        self.displayed
    }

    pub fn current(&self) -> Option<&ComicSummary> {
        self.slides.get(self.displayed)
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Image URL on a layer, if any
    pub fn layer_image(&self, layer: Layer) -> Option<&str> {
        self.layers[layer.slot()].as_deref()
    }

    /// Start a new auto-advance timer, invalidating any armed before it.
    /// Returns the generation the caller must hand back to `tick`.
    pub fn arm_timer(&mut self) -> u64 {
        self.timer_generation = next_generation();
        self.timer_generation
    }

    /// Show another slide.
    ///
    /// Returns the transition generation to hand back to
    /// `finish_transition`, or None when the index is already displayed,
    /// out of range, or a transition is still running.
    pub fn select(&mut self, index: usize, now: Instant) -> Option<u64> {
        if index == self.displayed || index >= self.slides.len() || self.transition.is_some() {
            return None;
        }

        let incoming = self.active.other();
        self.layers[incoming.slot()] = Some(self.slides[index].thumbnail.clone());
        self.active = incoming;
        self.displayed = index;

        let generation = next_generation();
        self.transition = Some(Transition {
            generation,
            started: now,
        });

        Some(generation)
    }

    /// Handle an auto-advance timer firing.
    ///
    /// A current timer moves to the next slide (circularly) unless a
    /// crossfade is still running.
    pub fn tick(&mut self, generation: u64, now: Instant) -> Tick {
        if generation != self.timer_generation || self.slides.len() < 2 {
            return Tick::Stale;
        }
        let next = (self.displayed + 1) % self.slides.len();
        match self.select(next, now) {
            Some(transition) => Tick::Advance(transition),
            None => Tick::Rearm,
        }
    }

    /// End the crossfade started with `generation`
    pub fn finish_transition(&mut self, generation: u64) {
        if matches!(self.transition, Some(t) if t.generation == generation) {
            self.transition = None;
        }
    }

    /// Opacity of a layer at `now`: the front layer fades in over the crossfade
    pub fn opacity(&self, layer: Layer, now: Instant) -> f32 {
        let progress = match self.transition {
            Some(transition) => {
                let elapsed = now.saturating_duration_since(transition.started);
                (elapsed.as_secs_f32() / CROSSFADE.as_secs_f32()).min(1.0)
            }
            None => 1.0,
        };

        if layer == self.active {
            progress
        } else {
            1.0 - progress
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(id: &str) -> ComicSummary {
        ComicSummary {
            id: id.to_string(),
            title: id.to_uppercase(),
            rating: 4.5,
            description: String::new(),
            thumbnail: format!("https://cdn.example/{id}.png"),
            genre: vec![],
        }
    }

    fn rotator() -> HeroRotator {
        HeroRotator::new(vec![slide("a"), slide("b"), slide("c")])
    }

    #[test]
    fn test_initial_layers() {
        let hero = rotator();
        assert_eq!(hero.displayed(), 0);
        assert_eq!(hero.layer_image(Layer::First), Some("https://cdn.example/a.png"));
        assert_eq!(hero.layer_image(Layer::Second), None);
        assert_eq!(hero.opacity(Layer::First, Instant::now()), 1.0);
    }

    #[test]
    fn test_select_uses_hidden_layer() {
        let mut hero = rotator();
        let now = Instant::now();

        assert!(hero.select(2, now).is_some());
        assert_eq!(hero.displayed(), 2);
        assert_eq!(hero.layer_image(Layer::Second), Some("https://cdn.example/c.png"));
        assert_eq!(hero.layer_image(Layer::First), Some("https://cdn.example/a.png"));
        assert_eq!(hero.opacity(Layer::Second, now), 0.0);
        assert_eq!(hero.opacity(Layer::Second, now + CROSSFADE), 1.0);
        assert_eq!(hero.opacity(Layer::First, now + CROSSFADE), 0.0);
    }

    #[test]
    fn test_transition_blocks_overlap() {
        let mut hero = rotator();
        let now = Instant::now();

        let generation = hero.select(1, now).unwrap();
        assert!(hero.select(2, now).is_none());
        assert_eq!(hero.displayed(), 1);

        hero.finish_transition(generation);
        assert!(!hero.is_transitioning());
        assert!(hero.select(2, now).is_some());
    }

    #[test]
    fn test_same_index_is_noop() {
        let mut hero = rotator();
        assert!(hero.select(0, Instant::now()).is_none());
        assert!(!hero.is_transitioning());
    }

    #[test]
    fn test_stale_timers_are_ignored() {
        let mut hero = rotator();
        let now = Instant::now();

        let first = hero.arm_timer();
        // A manual change re-arms the timer
        let second = hero.arm_timer();

        assert_eq!(hero.tick(first, now), Tick::Stale);
        assert_eq!(hero.displayed(), 0);

        assert!(matches!(hero.tick(second, now), Tick::Advance(_)));
        assert_eq!(hero.displayed(), 1);
    }

    #[test]
    fn test_tick_during_crossfade_rearms() {
        let mut hero = rotator();
        let now = Instant::now();

        let generation = hero.arm_timer();
        assert!(matches!(hero.tick(generation, now), Tick::Advance(_)));

        let generation = hero.arm_timer();
        assert_eq!(hero.tick(generation, now), Tick::Rearm);
        assert_eq!(hero.displayed(), 1);
    }

    #[test]
    fn test_single_slide_never_rotates() {
        let mut hero = HeroRotator::new(vec![slide("a")]);
        let generation = hero.arm_timer();
        assert_eq!(hero.tick(generation, Instant::now()), Tick::Stale);
    }

    #[test]
    fn test_timers_from_previous_rotator_are_ignored() {
        let now = Instant::now();
        let mut previous = rotator();
        let old_timer = previous.arm_timer();
        let old_transition = previous.select(1, now).unwrap();

        // Landing page rebuilt while the old timers are still pending
        let mut current = rotator();
        current.arm_timer();
        assert_eq!(current.tick(old_timer, now), Tick::Stale);
        assert_eq!(current.displayed(), 0);

        current.select(2, now).unwrap();
        current.finish_transition(old_transition);
        assert!(current.is_transitioning());
    }

    #[test]
    fn test_tick_wraps_around() {
        let mut hero = rotator();
        let now = Instant::now();

        for expected in [1, 2, 0] {
            let generation = hero.arm_timer();
            let Tick::Advance(transition) = hero.tick(generation, now) else {
                panic!("timer should advance to slide {expected}");
            };
            hero.finish_transition(transition);
            assert_eq!(hero.displayed(), expected);
        }
    }

    #[test]
    fn test_stale_transition_end_ignored() {
        let mut hero = rotator();
        let now = Instant::now();

        let first = hero.select(1, now).unwrap();
        hero.finish_transition(first);
        let _second = hero.select(2, now).unwrap();

        hero.finish_transition(first);
        assert!(hero.is_transitioning());
    }
}
