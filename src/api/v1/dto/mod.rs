pub mod token_review;
