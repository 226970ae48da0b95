// Copyright groupdag contributors.
//
// This software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, this software is distributed
// under the GPL Licence on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licence for the specific language
// governing permissions and limitations relating to use of this software.

//! Interpreter configuration.

const GROUPDAG_MAX_AUTHORITY_CYCLES: &str = "GROUPDAG_MAX_AUTHORITY_CYCLES";
const DEFAULT_MAX_AUTHORITY_CYCLES: usize = 100_000;

/// Tunables for [`crate::interpret`]. None of these affect the result for
/// a legitimate input — they only bound work against pathological ones.
#[derive(Debug, Clone, Copy)]
pub struct InterpreterConfig {
    /// Upper bound on the number of authority-graph cycle-exploration
    /// steps before giving up with `CycleBudgetExceeded` rather than
    /// diverging.
    pub max_authority_cycles: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            max_authority_cycles: max_authority_cycles(),
        }
    }
}

/// Reads the cycle-enumeration budget, defaulting to
/// `DEFAULT_MAX_AUTHORITY_CYCLES` but overridable by the
/// `GROUPDAG_MAX_AUTHORITY_CYCLES` env var.
fn max_authority_cycles() -> usize {
    match std::env::var(GROUPDAG_MAX_AUTHORITY_CYCLES) {
        Ok(value) => match value.parse() {
            Ok(budget) => {
                warn!(
                    "max_authority_cycles overridden from env var {}: {}",
                    GROUPDAG_MAX_AUTHORITY_CYCLES, budget
                );
                budget
            }
            Err(error) => {
                warn!(
                    "could not parse {} env var ({:?}); using default {}",
                    GROUPDAG_MAX_AUTHORITY_CYCLES, error, DEFAULT_MAX_AUTHORITY_CYCLES
                );
                DEFAULT_MAX_AUTHORITY_CYCLES
            }
        },
        Err(_) => DEFAULT_MAX_AUTHORITY_CYCLES,
    }
}
