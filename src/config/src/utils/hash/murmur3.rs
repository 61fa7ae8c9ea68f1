// Copyright 2025 OpenObserve Inc.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::io::Cursor;

use murmur3::murmur3_x64_128;

use super::Sum128;

pub struct Mr3 {}

pub fn new() -> Mr3 {
    Mr3 {}
}

impl Sum128 for Mr3 {
    fn sum128(&mut self, key: &str) -> u128 {
        let mut r = Cursor::new(key);
        murmur3_x64_128(&mut r, 0).unwrap()
    }
}
