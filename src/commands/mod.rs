// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod portfolios;
pub mod trades;
pub mod positions;
pub mod nav;
pub mod dividends;
pub mod prices;
pub mod importer;
pub mod exporter;
pub mod doctor;
