//! Density clustering of resources into base candidates.
//!
//! A resource is a core point when at least `min_resources` mineral fields
//! lie within `radius` of it, itself included. Clusters grow from each
//! unvisited core point through every density-reachable resource; border
//! points join the first cluster that reaches them and everything else is
//! noise. Geysers never make a point dense on their own, but are absorbed
//! like any other resource.

use crate::terrain::*;
use log::*;
use std::collections::VecDeque;

/// Indices of resources within `radius` of `index`, itself included.
fn region_query(resources: &[ResourceObject], index: usize, radius: i32) -> Vec<usize> {
    let origin = resources[index].position;
    resources
        .iter()
        .enumerate()
        .filter(|(_, r)| origin.approx_distance(r.position) <= radius)
        .map(|(i, _)| i)
        .collect()
}

fn mineral_count(resources: &[ResourceObject], indices: &[usize]) -> usize {
    indices.iter().filter(|i| resources[**i].is_mineral()).count()
}

/// Cluster resources, returning each cluster as indices into `resources`.
/// Membership is deterministic for a given input order.
pub fn cluster_resources(resources: &[ResourceObject], radius: i32, min_resources: usize) -> Vec<Vec<usize>> {
    let neighborhoods: Vec<Vec<usize>> = (0..resources.len())
        .map(|i| region_query(resources, i, radius))
        .collect();
    let is_core = |i: usize| mineral_count(resources, &neighborhoods[i]) >= min_resources;

    let mut visited = vec![false; resources.len()];
    let mut clustered = vec![false; resources.len()];
    let mut clusters = Vec::new();

    for start in 0..resources.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        if !is_core(start) {
            continue;
        }

        let mut cluster = vec![start];
        clustered[start] = true;
        let mut queue: VecDeque<usize> = neighborhoods[start].iter().copied().collect();

        while let Some(next) = queue.pop_front() {
            if !visited[next] {
                visited[next] = true;
                if is_core(next) {
                    queue.extend(neighborhoods[next].iter().copied());
                }
            }
            if !clustered[next] {
                clustered[next] = true;
                cluster.push(next);
            }
        }

        if mineral_count(resources, &cluster) < min_resources {
            for i in &cluster {
                clustered[*i] = false;
            }
            continue;
        }
        cluster.sort_unstable();
        clusters.push(cluster);
    }

    let noise = clustered.iter().filter(|c| !**c).count();
    debug!(
        "Clustered {} resources into {} clusters, {} noise",
        resources.len(),
        clusters.len(),
        noise
    );

    clusters
}
