//! Cascade detector seam and OpenCV-style raw-hit grouping.
//!
//! A cascade detector reports geometry only. Raw window hits from one pass are
//! clustered by similarity, averaged, and kept only when enough neighbours
//! agree.

use crate::config::PassParams;
use crate::types::FaceBox;
use image::GrayImage;
use thiserror::Error;

/// Relative tolerance used when clustering raw window hits.
pub const GROUP_EPS: f64 = 0.2;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("invalid pass parameters: {0}")]
    InvalidParams(String),
    #[error("image too small for detection window: {width}x{height}")]
    ImageTooSmall { width: u32, height: u32 },
    #[error("detection failed: {0}")]
    Failed(String),
}

/// A multi-scale face-region detector.
///
/// Implementations are immutable once built and shared between passes and
/// threads. Boxes come back in discovery order with no confidence attached.
pub trait CascadeDetector: Send + Sync {
    fn detect(&self, gray: &GrayImage, params: &PassParams) -> Result<Vec<FaceBox>, DetectorError>;
}

fn similar(a: &FaceBox, b: &FaceBox, eps: f64) -> bool {
    let delta = eps * (a.width.min(b.width) as f64 + a.height.min(b.height) as f64) * 0.5;
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    (ax - bx).abs() <= delta
        && (ay - by).abs() <= delta
        && (ax + a.width as f64 - bx - b.width as f64).abs() <= delta
        && (ay + a.height as f64 - by - b.height as f64).abs() <= delta
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Cluster raw hits and keep clusters with more than `min_neighbors` members.
///
/// Clusters are averaged, then a surviving cluster that sits inside a
/// stronger one is dropped. Output follows the order in which each cluster's
/// first member was found. `min_neighbors == 0` returns the hits unchanged.
pub fn group_rectangles(rects: &[FaceBox], min_neighbors: u32, eps: f64) -> Vec<FaceBox> {
    if min_neighbors == 0 || rects.is_empty() {
        return rects.to_vec();
    }

    let n = rects.len();
    let mut parent: Vec<usize> = (0..n).collect();
    for i in 0..n {
        for j in 0..i {
            if similar(&rects[i], &rects[j], eps) {
                let ri = find(&mut parent, i);
                let rj = find(&mut parent, j);
                if ri != rj {
                    // Keep the lower index as root so labels follow discovery order.
                    let (lo, hi) = if ri < rj { (ri, rj) } else { (rj, ri) };
                    parent[hi] = lo;
                }
            }
        }
    }

    // Dense labels in first-appearance order.
    let mut label_of_root = vec![usize::MAX; n];
    let mut sums: Vec<([f64; 4], u32)> = Vec::new();
    for (i, r) in rects.iter().enumerate() {
        let root = find(&mut parent, i);
        if label_of_root[root] == usize::MAX {
            label_of_root[root] = sums.len();
            sums.push(([0.0; 4], 0));
        }
        let (acc, count) = &mut sums[label_of_root[root]];
        acc[0] += r.x as f64;
        acc[1] += r.y as f64;
        acc[2] += r.width as f64;
        acc[3] += r.height as f64;
        *count += 1;
    }

    let clusters: Vec<(FaceBox, u32)> = sums
        .iter()
        .map(|(acc, count)| {
            let s = 1.0 / *count as f64;
            let avg = FaceBox::new(
                (acc[0] * s).round() as u32,
                (acc[1] * s).round() as u32,
                (acc[2] * s).round() as u32,
                (acc[3] * s).round() as u32,
            );
            (avg, *count)
        })
        .collect();

    let mut out = Vec::new();
    for (i, &(r1, n1)) in clusters.iter().enumerate() {
        if n1 <= min_neighbors {
            continue;
        }
        let nested = clusters.iter().enumerate().any(|(j, &(r2, n2))| {
            if j == i || n2 <= min_neighbors {
                return false;
            }
            let dx = (r2.width as f64 * eps).round();
            let dy = (r2.height as f64 * eps).round();
            let (x1, y1) = (r1.x as f64, r1.y as f64);
            let (x2, y2) = (r2.x as f64, r2.y as f64);
            x1 >= x2 - dx
                && y1 >= y2 - dy
                && x1 + r1.width as f64 <= x2 + r2.width as f64 + dx
                && y1 + r1.height as f64 <= y2 + r2.height as f64 + dy
                && (n2 > n1.max(3) || n1 < 3)
        });
        if !nested {
            out.push(r1);
        }
    }
    out
}
