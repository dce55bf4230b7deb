use rand::seq::IteratorRandom;
use rand::Rng;
use rand::SeedableRng;
use rayon::prelude::*;

/// Number of clusters. Fixed per the round feature engine's design.
pub const K: usize = 5;

const BATCH_SIZE: usize = 256;
const ITERATIONS: usize = 100;

/// A fitted set of centroids, one per cluster.
pub struct Centroids {
    points: Vec<Vec<f64>>,
}

impl Centroids {
    /// Fits `K` centroids on `x` via mini-batch Lloyd's algorithm: each
    /// iteration samples a batch, assigns every batch point to its nearest
    /// centroid, and nudges that centroid toward the point with a
    /// per-cluster learning rate that shrinks as the cluster absorbs more
    /// points (the same streaming-mean update sklearn's MiniBatchKMeans
    /// uses).
    pub fn fit(x: &[Vec<f64>]) -> Self {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(0x5eed);
        let dim = x.first().map(|p| p.len()).unwrap_or(0);
        let mut points: Vec<Vec<f64>> = (0..x.len())
            .choose_multiple(&mut rng, K.min(x.len()))
            .into_iter()
            .map(|i| x[i].clone())
            .collect();
        while points.len() < K {
            points.push(vec![0.0; dim]);
        }
        let mut counts = [0u64; K];

        for _ in 0..ITERATIONS {
            if x.is_empty() {
                break;
            }
            let batch: Vec<usize> = (0..x.len())
                .map(|_| rng.random_range(0..x.len()))
                .take(BATCH_SIZE.min(x.len().max(1)))
                .collect();
            for idx in batch {
                let point = &x[idx];
                let cluster = nearest(point, &points);
                counts[cluster] += 1;
                let eta = 1.0 / counts[cluster] as f64;
                for (c, p) in points[cluster].iter_mut().zip(point.iter()) {
                    *c += eta * (p - *c);
                }
            }
        }

        Self { points }
    }

    /// Assigns each point in `data` to its nearest centroid, in parallel.
    pub fn predict(&self, data: &[Vec<f64>]) -> Vec<usize> {
        data.par_iter()
            .map(|point| nearest(point, &self.points))
            .collect()
    }
}

fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> usize {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, squared_distance(point, c)))
        .min_by(|(_, d1), (_, d2)| d1.partial_cmp(d2).unwrap())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_points_always_land_in_the_same_cluster() {
        let corners = [
            vec![0.0, 0.0],
            vec![10.0, 10.0],
            vec![-10.0, 10.0],
            vec![10.0, -10.0],
            vec![-10.0, -10.0],
        ];
        let mut x = Vec::new();
        for _ in 0..50 {
            x.extend(corners.iter().cloned());
        }
        let centroids = Centroids::fit(&x);
        let assignments = centroids.predict(&corners);
        let predicted_again = centroids.predict(&corners);
        assert_eq!(assignments, predicted_again);
        assert_eq!(assignments.len(), corners.len());
    }

    #[test]
    fn nearest_picks_the_closer_centroid() {
        let centroids = vec![vec![0.0, 0.0], vec![100.0, 100.0]];
        assert_eq!(nearest(&[1.0, 1.0], &centroids), 0);
        assert_eq!(nearest(&[99.0, 99.0], &centroids), 1);
    }
}
