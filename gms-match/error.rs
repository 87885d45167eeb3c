use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GmsError {
    #[error("image {which} has an empty size ({width}x{height})")]
    EmptyImage { which: u8, width: u32, height: u32 },

    #[error("match {position} refers to query keypoint {index}, but only {len} exist")]
    QueryIndexOutOfRange { position: usize, index: usize, len: usize },

    #[error("match {position} refers to train keypoint {index}, but only {len} exist")]
    TrainIndexOutOfRange { position: usize, index: usize, len: usize },
}

pub type GmsResult<T> = Result<T, GmsError>;
