//! Sprite-sheet clips and the per-object animator that steps them.

/// A run of atlas cells shown at a fixed rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    /// Atlas cells as (col, row).
    pub frames: Vec<(f32, f32)>,
    /// Seconds each cell stays on screen.
    pub frame_time: f32,
    pub looping: bool,
}

impl Clip {
    /// `count` consecutive cells of one atlas row, looping at `fps`.
    pub fn strip(row: f32, first_col: f32, count: u32, fps: f32) -> Self {
        Self {
            frames: (0..count).map(|i| (first_col + i as f32, row)).collect(),
            frame_time: if fps > 0.0 { 1.0 / fps } else { 0.0 },
            looping: true,
        }
    }

    /// Play once and hold the last cell.
    pub fn once(mut self) -> Self {
        self.looping = false;
        self
    }

    pub fn duration(&self) -> f32 {
        self.frame_time * self.frames.len() as f32
    }
}

/// Named clips for one object and the playhead into the current one.
///
/// Clip names are static: entity state machines name their clips with
/// string constants.
#[derive(Debug, Clone)]
pub struct Animator {
    clips: Vec<(&'static str, Clip)>,
    current: usize,
    frame: usize,
    elapsed: f32,
    finished: bool,
    /// Playback rate multiplier.
    pub speed: f32,
}

impl Animator {
    pub fn new(name: &'static str, clip: Clip) -> Self {
        Self {
            clips: vec![(name, clip)],
            current: 0,
            frame: 0,
            elapsed: 0.0,
            finished: false,
            speed: 1.0,
        }
    }

    /// Register another clip. A repeated name replaces the earlier clip.
    pub fn with(mut self, name: &'static str, clip: Clip) -> Self {
        match self.clips.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = clip,
            None => self.clips.push((name, clip)),
        }
        self
    }

    pub fn clip_name(&self) -> &'static str {
        self.clips[self.current].0
    }

    fn clip(&self) -> &Clip {
        &self.clips[self.current].1
    }

    /// Switch clips, restarting from the first cell. Switching to the
    /// clip already playing, or to an unknown name, changes nothing.
    pub fn switch_to(&mut self, name: &str) {
        if self.clip_name() == name {
            return;
        }
        if let Some(index) = self.clips.iter().position(|(n, _)| *n == name) {
            self.current = index;
            self.frame = 0;
            self.elapsed = 0.0;
            self.finished = false;
        }
    }

    /// Atlas cell to draw now.
    pub fn cell(&self) -> Option<(f32, f32)> {
        self.clip().frames.get(self.frame).copied()
    }

    pub fn frame_index(&self) -> usize {
        self.frame
    }

    /// A one-shot clip is holding its last cell.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Step the playhead. Returns the clip name when a one-shot clip
    /// reaches its end during this step.
    pub fn advance(&mut self, dt: f32) -> Option<&'static str> {
        if self.finished {
            return None;
        }
        let (count, frame_time, looping) = {
            let clip = self.clip();
            (clip.frames.len(), clip.frame_time, clip.looping)
        };
        if count == 0 || frame_time <= 0.0 {
            return None;
        }

        self.elapsed += dt * self.speed;
        while self.elapsed >= frame_time {
            self.elapsed -= frame_time;
            if self.frame + 1 < count {
                self.frame += 1;
            } else if looping {
                self.frame = 0;
            } else {
                self.elapsed = 0.0;
                self.finished = true;
                return Some(self.clip_name());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looping_strip_wraps() {
        let mut anim = Animator::new("run", Clip::strip(1.0, 0.0, 3, 10.0));
        assert_eq!(anim.cell(), Some((0.0, 1.0)));
        assert_eq!(anim.advance(0.15), None);
        assert_eq!(anim.cell(), Some((1.0, 1.0)));
        anim.advance(0.2);
        assert_eq!(anim.frame_index(), 0);
    }

    #[test]
    fn one_shot_holds_last_cell() {
        let mut anim = Animator::new("attack", Clip::strip(4.0, 0.0, 3, 10.0).once());
        assert_eq!(anim.advance(0.25), None);
        assert_eq!(anim.advance(0.1), Some("attack"));
        assert!(anim.is_finished());
        assert_eq!(anim.cell(), Some((2.0, 4.0)));
        assert_eq!(anim.advance(1.0), None);
    }

    #[test]
    fn switching_restarts_only_on_change() {
        let mut anim = Animator::new("idle", Clip::strip(0.0, 0.0, 4, 5.0)).with("fall", Clip::strip(2.0, 1.0, 1, 1.0));
        anim.advance(0.25);
        anim.switch_to("idle");
        assert_eq!(anim.frame_index(), 1);

        anim.switch_to("fall");
        assert_eq!((anim.clip_name(), anim.frame_index()), ("fall", 0));
        anim.switch_to("swim");
        assert_eq!(anim.clip_name(), "fall");
    }
}
