use std::fmt;

use indexmap::IndexMap;
use log::{debug, info};
use nalgebra::{Matrix2, Matrix2x4, Matrix4, Vector2, Vector4};
use serde::{Deserialize, Serialize};

use crate::{geometry_utils::distance_points, tracking::TrackedTarget, Point2D};

#[derive(Debug)]
pub enum TrackError {
    /// The innovation covariance was not invertible during a filter update.
    /// Indicates a non-positive-definite measurement noise configuration,
    /// not a transient condition.
    SingularInnovation,
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrackError::SingularInnovation => {
                write!(f, "numerically singular innovation covariance")
            }
        }
    }
}

impl std::error::Error for TrackError {}

/// Prediction dynamics for a position filter. Both variants share the same
/// state shape and the same linear correction step.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MotionModel {
    ConstantVelocity,
    ConstantAcceleration,
}

/// How current-frame clusters are matched to existing tracks.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum AssociationStrategy {
    /// Positional matching: cluster index i goes to track slot i. Fragile to
    /// cluster-count changes; kept for compatibility with the original
    /// behaviour.
    SlotIndex,
    /// Greedy globally-nearest matching between live tracks and centroids,
    /// gated by a maximum distance.
    #[serde(rename_all = "camelCase")]
    NearestCentroid { max_distance: f32 },
}

/// What happens to a track that received no cluster this frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum UnmatchedPolicy {
    /// Leave the filter fully untouched; the estimate goes stale in place.
    Hold,
    /// Run the prediction step without a correction.
    Coast,
}

/// Recursive estimator over state `[x, y, vx, vy]` with position-only
/// measurements.
#[derive(Debug, Clone)]
pub struct PositionFilter {
    model: MotionModel,
    state: Vector4<f32>,
    p: Matrix4<f32>,
    q: Matrix4<f32>,
    h: Matrix2x4<f32>,
    r: Matrix2<f32>,
}

impl PositionFilter {
    /// New filter centred at the given position with zero initial velocity.
    /// `p0` is large (uncertain start), `q` small (trusted motion model),
    /// `r` moderate (noisy measurements).
    pub fn new(model: MotionModel, position: Point2D, p0: f32, q: f32, r: f32) -> Self {
        let (x, y) = position;
        PositionFilter {
            model,
            state: Vector4::new(x, y, 0., 0.),
            p: Matrix4::identity() * p0,
            q: Matrix4::identity() * q,
            h: Matrix2x4::new(
                1., 0., 0., 0., //
                0., 1., 0., 0.,
            ),
            r: Matrix2::identity() * r,
        }
    }

    pub fn predict(&mut self, dt: f32) {
        match self.model {
            MotionModel::ConstantVelocity => {
                let f = Matrix4::new(
                    1., 0., dt, 0., //
                    0., 1., 0., dt, //
                    0., 0., 1., 0., //
                    0., 0., 0., 1.,
                );
                self.state = f * self.state;
                self.p = f * self.p * f.transpose() + self.q;
            }
            MotionModel::ConstantAcceleration => {
                // State propagated in closed form with a unit-acceleration
                // half-dt² term on the positions; covariance through the
                // Jacobian carrying the dt²/2 column.
                let half_dt2 = 0.5 * dt * dt;
                let (vx, vy) = (self.state[2], self.state[3]);
                self.state[0] += vx * dt + half_dt2;
                self.state[1] += vy * dt + half_dt2;

                let f = Matrix4::new(
                    1., 0., dt, half_dt2, //
                    0., 1., 0., dt, //
                    0., 0., 1., 0., //
                    0., 0., 0., 1.,
                );
                self.p = f * self.p * f.transpose() + self.q;
            }
        }
    }

    /// Standard linear correction, shared by both motion models.
    pub fn update(&mut self, x: f32, y: f32) -> Result<(), TrackError> {
        let z = Vector2::new(x, y);
        let innovation = z - self.h * self.state;
        let s = self.h * self.p * self.h.transpose() + self.r;
        let s_inv = s.try_inverse().ok_or(TrackError::SingularInnovation)?;
        let k = self.p * self.h.transpose() * s_inv;
        self.state += k * innovation;
        self.p = (Matrix4::identity() - k * self.h) * self.p;
        Ok(())
    }

    pub fn position(&self) -> Point2D {
        (self.state[0], self.state[1])
    }

    pub fn velocity(&self) -> (f32, f32) {
        (self.state[2], self.state[3])
    }

    /// Trace of the estimate covariance; a rough scalar uncertainty.
    pub fn uncertainty(&self) -> f32 {
        self.p.trace()
    }
}

#[derive(Debug)]
struct Track {
    filter: PositionFilter,
    missed_frames: u32,
    last_measured: Option<Point2D>,
}

/// Settings for the track bank, normally taken from `PipelineConfig`.
#[derive(Debug, Clone, Copy)]
pub struct TrackSettings {
    pub motion_model: MotionModel,
    pub association: AssociationStrategy,
    pub unmatched_policy: UnmatchedPolicy,
    /// Evict a track after this many consecutive unmatched frames;
    /// `None` keeps every track forever (the original grow-only bank).
    pub expire_after_frames: Option<u32>,
    /// Nominal inter-frame interval in seconds; not measured from wall clock.
    pub frame_interval: f32,
    pub initial_covariance: f32,
    pub process_noise: f32,
    pub measurement_noise: f32,
}

/// One recursive estimator per tracked blob, updated in predict/correct
/// lock-step with the frame cadence. The bank is the only state that
/// persists across frames.
pub struct TrackBank {
    settings: TrackSettings,
    tracks: IndexMap<usize, Track>,
    next_id: usize,
}

impl TrackBank {
    pub fn new(settings: TrackSettings) -> Self {
        TrackBank {
            settings,
            tracks: IndexMap::new(),
            next_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Feed one frame's cluster centroids through the bank. Every matched
    /// track runs predict then update exactly once; unmatched tracks follow
    /// the configured policy. Returns the current estimates in stable bank
    /// order.
    pub fn observe(&mut self, centroids: &[Point2D]) -> Result<Vec<TrackedTarget>, TrackError> {
        let assignment = match self.settings.association {
            AssociationStrategy::SlotIndex => self.assign_by_slot(centroids),
            AssociationStrategy::NearestCentroid { max_distance } => {
                self.assign_by_distance(centroids, max_distance)
            }
        };

        let dt = self.settings.frame_interval;

        for (track_id, centroid_index) in assignment.iter() {
            let track = self
                .tracks
                .get_mut(track_id)
                .expect("assignment references a live track");
            let (cx, cy) = centroids[*centroid_index];
            track.filter.predict(dt);
            track.filter.update(cx, cy)?;
            track.missed_frames = 0;
            track.last_measured = Some((cx, cy));
        }

        for (id, track) in self.tracks.iter_mut() {
            if assignment.contains_key(id) {
                continue;
            }
            track.missed_frames += 1;
            track.last_measured = None;
            match self.settings.unmatched_policy {
                UnmatchedPolicy::Hold => {}
                UnmatchedPolicy::Coast => track.filter.predict(dt),
            }
        }

        if let Some(limit) = self.settings.expire_after_frames {
            let before = self.tracks.len();
            self.tracks.retain(|id, track| {
                if track.missed_frames >= limit {
                    info!("Track {} expired after {} unmatched frames", id, limit);
                    false
                } else {
                    true
                }
            });
            if self.tracks.len() != before {
                debug!("Bank shrank from {} to {} tracks", before, self.tracks.len());
            }
        }

        Ok(self
            .tracks
            .iter()
            .map(|(id, track)| {
                let mut target = TrackedTarget::new(*id, track.filter.position());
                let (vx, vy) = track.filter.velocity();
                target.velocity = Some([vx, vy]);
                target.measured = track.last_measured;
                target
            })
            .collect())
    }

    /// Positional association: cluster i belongs to slot i. A slot's filter
    /// is created lazily the first time the index is seen, initialised at
    /// that frame's centroid.
    fn assign_by_slot(&mut self, centroids: &[Point2D]) -> IndexMap<usize, usize> {
        let mut assignment = IndexMap::new();
        for (slot, centroid) in centroids.iter().enumerate() {
            if !self.tracks.contains_key(&slot) {
                info!("New track in slot {} at {:?}", slot, centroid);
                let track = self.new_track(*centroid);
                self.tracks.insert(slot, track);
                self.next_id = self.next_id.max(slot + 1);
            }
            assignment.insert(slot, slot);
        }
        assignment
    }

    /// Greedy globally-nearest matching with a distance gate: candidate
    /// pairs are sorted by distance and consumed closest-first, each track
    /// and each centroid used at most once. Leftover centroids spawn new
    /// tracks with fresh monotonic ids.
    fn assign_by_distance(
        &mut self,
        centroids: &[Point2D],
        max_distance: f32,
    ) -> IndexMap<usize, usize> {
        let mut candidates: Vec<(f32, usize, usize)> = Vec::new();
        for (id, track) in self.tracks.iter() {
            let position = track.filter.position();
            for (ci, centroid) in centroids.iter().enumerate() {
                let d = distance_points(&position, centroid);
                if d <= max_distance {
                    candidates.push((d, *id, ci));
                }
            }
        }
        candidates.sort_by(|a, b| f32::total_cmp(&a.0, &b.0));

        let mut assignment: IndexMap<usize, usize> = IndexMap::new();
        let mut centroid_taken = vec![false; centroids.len()];
        for (_d, id, ci) in candidates {
            if centroid_taken[ci] || assignment.contains_key(&id) {
                continue;
            }
            centroid_taken[ci] = true;
            assignment.insert(id, ci);
        }

        for (ci, centroid) in centroids.iter().enumerate() {
            if centroid_taken[ci] {
                continue;
            }
            let id = self.next_id;
            self.next_id += 1;
            info!("New track {} at {:?}", id, centroid);
            let track = self.new_track(*centroid);
            self.tracks.insert(id, track);
            assignment.insert(id, ci);
        }

        assignment
    }

    fn new_track(&self, position: Point2D) -> Track {
        Track {
            filter: PositionFilter::new(
                self.settings.motion_model,
                position,
                self.settings.initial_covariance,
                self.settings.process_noise,
                self.settings.measurement_noise,
            ),
            missed_frames: 0,
            last_measured: None,
        }
    }
}
