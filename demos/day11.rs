// SPDX-FileCopyrightText: 2024 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Advent of Code 2019 Day 11: drive the hull painting robot.
//!
//! The robot's brain suspends every time it needs to see the panel it's on, so the camera is
//! just the input passed in when resuming it.

use intcode::prelude::*;

use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
struct Location {
    x: i32,
    y: i32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    const fn turned(self, code: i64) -> Self {
        match (self, code) {
            (Self::Up, 0) | (Self::Down, 1) => Self::Left,
            (Self::Right, 0) | (Self::Left, 1) => Self::Up,
            (Self::Down, 0) | (Self::Up, 1) => Self::Right,
            (Self::Left, 0) | (Self::Right, 1) => Self::Down,
            _ => panic!("invalid direction code"),
        }
    }
}

impl std::ops::AddAssign<Direction> for Location {
    fn add_assign(&mut self, dir: Direction) {
        match dir {
            Direction::Up => self.y -= 1,
            Direction::Right => self.x += 1,
            Direction::Down => self.y += 1,
            Direction::Left => self.x -= 1,
        }
    }
}

/// Run the robot to completion, returning the color of every panel it painted. Panels are 1 for
/// white and 0 for black, and any panel not in the map is black.
fn paint(mut brain: Machine, start_color: i64) -> HashMap<Location, i64> {
    let mut panels = HashMap::new();
    if start_color != 0 {
        panels.insert(Location::default(), start_color);
    }
    let mut location = Location::default();
    let mut direction = Direction::Up;

    loop {
        let seen = panels.get(&location).copied().unwrap_or(0);
        let (outputs, outcome) = brain.run_through_inputs([seen]).expect("robot brain crashed");
        if let [color, turn] = outputs[..] {
            assert!(matches!(color, 0 | 1), "invalid paint color: {color}");
            panels.insert(location, color);
            direction = direction.turned(turn);
            location += direction;
        } else {
            assert!(outputs.is_empty(), "output wasn't a pair: {outputs:?}");
        }
        if outcome.is_halted() {
            break panels;
        }
    }
}

fn main() {
    let path = std::env::args_os().nth(1).expect("must provide file");
    let brain: Machine = std::fs::read_to_string(path)
        .expect("Failed to read file!")
        .parse()
        .expect("Could not parse intcode");

    // the starting panel only counts if the robot paints it
    let painted = paint(brain.clone(), 0).len();
    println!("part 1: {painted}");

    let panels = paint(brain, 1);
    let (min_x, max_x) = panels.keys().map(|l| l.x).fold((i32::MAX, i32::MIN), |(lo, hi), x| {
        (lo.min(x), hi.max(x))
    });
    let (min_y, max_y) = panels.keys().map(|l| l.y).fold((i32::MAX, i32::MIN), |(lo, hi), y| {
        (lo.min(y), hi.max(y))
    });
    println!("part 2:");
    for y in min_y..=max_y {
        let row: String = (min_x..=max_x)
            .map(|x| match panels.get(&Location { x, y }) {
                Some(1) => '#',
                _ => ' ',
            })
            .collect();
        println!("{row}");
    }
}
