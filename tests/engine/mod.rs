mod degraded;
mod snapshots;
