// gridsynth - exact Clifford+T approximation of single-qubit Z rotations
// Copyright (C) 2025 - Aleks Kissinger
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

pub mod real;
pub mod config;
pub mod error;
pub mod rings;
pub mod linalg;
pub mod matrix;
pub mod grid_op;
pub mod regions;
pub mod states;
pub mod grid_solvers;
pub mod diophantine;
pub mod rz_approx;
pub mod s3_table;
pub mod exact_synthesis;
pub mod synthesizer;
pub mod cli;

pub use config::{Context, GridSynthOptions};
pub use error::SynthError;
pub use matrix::DOmegaMatrix;
pub use real::Real;
pub use s3_table::S3Table;
pub use synthesizer::GridSynthesizer;
