//! Solve a small resource-constrained shortest path instance and print
//! the result.

use rcsp::BiDirectional;

fn main() {
    let mut alg =
        BiDirectional::new(5, 5, 0, 4, vec![4.0, 20.0], vec![0.0, 0.0]).expect("valid bounds");
    alg.add_nodes(&[0, 1, 2, 3, 4]);
    for (tail, head, weight, res) in [
        (0usize, 1usize, -1.0, [1.0, 2.0]),
        (1, 2, -1.0, [1.0, 0.3]),
        (2, 3, -10.0, [1.0, 3.0]),
        (2, 4, 10.0, [1.0, 2.0]),
        (3, 4, -1.0, [1.0, 10.0]),
    ] {
        alg.add_edge(tail, head, weight, &res).expect("valid edge");
    }
    alg.run().expect("valid configuration");

    println!("path: {:?}", alg.path());
    println!("cost: {}", alg.total_cost());
    println!("consumed resources: {:?}", alg.consumed_resources());
}
