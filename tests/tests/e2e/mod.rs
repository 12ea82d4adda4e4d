mod lifecycle;
mod reconstruct;
