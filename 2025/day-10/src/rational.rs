use num::{BigInt, BigRational, One, Signed, Zero};

use crate::{machine::Machine, part2::SolveError};

/// Augmented matrix `[A | b]` over exact rationals: one row per counter,
/// one column per button plus the target column.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedMatrix {
    rows: Vec<Vec<BigRational>>,
    num_vars: usize,
}

/// An augmented matrix in Reduced Row Echelon Form.
#[derive(Debug, Clone, PartialEq)]
pub struct Rref {
    rows: Vec<Vec<BigRational>>,
    num_vars: usize,
    /// Pivot column of each leading row, in row order.
    pivots: Vec<usize>,
}

/// Effect of raising one free variable by one.
#[derive(Debug, Clone, PartialEq)]
pub struct NullVector {
    /// Column of the free variable this vector belongs to.
    pub free: usize,
    /// Change applied to every variable, pivot and free.
    pub direction: Vec<BigRational>,
}

/// Affine solution set `particular + Σ c_i * basis[i].direction`.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionSpace {
    /// Solution with every free variable set to zero.
    pub particular: Vec<BigRational>,
    pub basis: Vec<NullVector>,
}

fn rational(value: impl Into<BigInt>) -> BigRational {
    BigRational::from_integer(value.into())
}

impl AugmentedMatrix {
    /// Builds a matrix from integer rows, the last entry of each being the
    /// right-hand side.
    pub fn new(rows: &[Vec<i64>]) -> Self {
        let num_vars = rows.first().map_or(0, |row| row.len().saturating_sub(1));
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|&v| rational(v)).collect())
            .collect();
        Self { rows, num_vars }
    }

    pub fn from_machine(machine: &Machine) -> Self {
        let num_eqs = machine.counters();
        let num_vars = machine.buttons.len();

        let mut rows = vec![vec![BigRational::zero(); num_vars + 1]; num_eqs];
        for button in 0..num_vars {
            for counter in machine.incidence(button, num_eqs) {
                rows[counter][button] = BigRational::one();
            }
        }
        for (row, &target) in rows.iter_mut().zip(&machine.targets) {
            row[num_vars] = rational(target);
        }

        Self { rows, num_vars }
    }

    /// Gauss-Jordan elimination. Arithmetic is exact, so the first non-zero
    /// entry of a column is as good a pivot as any.
    pub fn into_rref(self) -> Rref {
        let Self { mut rows, num_vars } = self;
        let num_eqs = rows.len();
        let mut pivots = Vec::new();

        for col in 0..num_vars {
            let pivot_row = pivots.len();
            if pivot_row >= num_eqs {
                break;
            }

            let Some(found) = (pivot_row..num_eqs).find(|&r| !rows[r][col].is_zero()) else {
                continue;
            };
            rows.swap(pivot_row, found);

            let scale = rows[pivot_row][col].clone();
            for value in rows[pivot_row].iter_mut() {
                *value = &*value / &scale;
            }

            let pivot = rows[pivot_row].clone();
            for (r, row) in rows.iter_mut().enumerate() {
                if r == pivot_row || row[col].is_zero() {
                    continue;
                }
                let factor = row[col].clone();
                for (value, p) in row.iter_mut().zip(&pivot) {
                    *value -= &factor * p;
                }
            }

            pivots.push(col);
        }

        Rref {
            rows,
            num_vars,
            pivots,
        }
    }
}

impl Rref {
    pub fn pivots(&self) -> &[usize] {
        &self.pivots
    }

    pub fn rows(&self) -> &[Vec<BigRational>] {
        &self.rows
    }

    /// Columns without a pivot, in increasing order.
    pub fn free_columns(&self) -> Vec<usize> {
        (0..self.num_vars)
            .filter(|c| !self.pivots.contains(c))
            .collect()
    }

    /// `false` when some row reads `0 = b` with `b != 0`.
    pub fn is_consistent(&self) -> bool {
        self.rows.iter().all(|row| {
            let (coefficients, rhs) = row.split_at(self.num_vars);
            !coefficients.iter().all(Zero::is_zero) || rhs.iter().all(Zero::is_zero)
        })
    }

    pub fn solution_space(&self) -> Result<SolutionSpace, SolveError> {
        if !self.is_consistent() {
            return Err(SolveError::Inconsistent);
        }

        let rhs = self.num_vars;
        let mut particular = vec![BigRational::zero(); self.num_vars];
        for (row, &col) in self.pivots.iter().enumerate() {
            particular[col] = self.rows[row][rhs].clone();
        }

        let basis = self
            .free_columns()
            .into_iter()
            .map(|free| {
                let mut direction = vec![BigRational::zero(); self.num_vars];
                direction[free] = BigRational::one();
                for (row, &col) in self.pivots.iter().enumerate() {
                    direction[col] = -&self.rows[row][free];
                }
                NullVector { free, direction }
            })
            .collect();

        Ok(SolutionSpace { particular, basis })
    }
}

impl SolutionSpace {
    pub fn num_vars(&self) -> usize {
        self.particular.len()
    }

    /// Change in total cost per unit of each free variable.
    pub fn weights(&self) -> Vec<BigRational> {
        self.basis
            .iter()
            .map(|v| v.direction.iter().sum())
            .collect()
    }

    /// The point reached by setting the free variables to `coefficients`.
    pub fn evaluate(&self, coefficients: &[u64]) -> Vec<BigRational> {
        let mut x = self.particular.clone();
        for (vector, &c) in self.basis.iter().zip(coefficients) {
            let c = rational(c);
            for (value, d) in x.iter_mut().zip(&vector.direction) {
                *value += &c * d;
            }
        }
        x
    }
}

/// `true` when every entry is a whole number no smaller than zero.
pub fn is_non_negative_integral(x: &[BigRational]) -> bool {
    x.iter().all(|v| v.is_integer() && !v.is_negative())
}
