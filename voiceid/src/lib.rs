//! Cross-video voice identity resolution.
//!
//! Speaker records come from an external detector, one record per voice per
//! video. This crate groups records that likely belong to the same real voice
//! and scores how confident that grouping is.
//!
//! # Usage
//!
//! ```
//! use voicelab_voiceid::{ClusterEngine, SpeakerRecord};
//!
//! let records = vec![
//!     SpeakerRecord::new("s1", "Alex", "american", "video-a", 8.0),
//!     SpeakerRecord::new("s2", "Alex", "american", "video-b", 8.0),
//! ];
//!
//! let engine = ClusterEngine::default();
//! let matches = engine.find_cross_video_matches(&records);
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].confidence, 94.0);
//! ```
//!
//! # Pipeline
//!
//! 1. [`SignatureBuilder::build`]: record -> coarse key
//!    (`name_accent_pitch_tone`)
//! 2. [`ClusterEngine::analyze`]: partition by key, drop single-video groups
//! 3. [`score_group`]: weighted name/accent/quality consistency in [0, 100]
//!
//! Equal signatures only make records *candidates* for the same voice. The
//! confidence score is what separates a solid match from a coincidence.

mod cluster;
mod scorer;
mod signature;
mod types;

pub use cluster::{ClusterEngine, ClusterOverview, ClusterReport};
pub use scorer::{score_group, MatchWeights};
pub use signature::{BucketRule, SignatureBuilder, SignatureConfig};
pub use types::{CrossVideoMatch, SpeakerRecord};
