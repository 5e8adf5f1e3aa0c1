//! # FFT 友好尺寸计算
//!
//! 相位恢复对数据尺寸有 FFT 要求：最大素因子不超过 maxprime
//! （GPU FFT 库的限制），并包含指定的因子。预处理默认 maxprime = 7、
//! 因子 2。算法改写自 PyNX。
//!
//! ## 依赖关系
//! - 被 `bragg/center.rs` 调用

/// 返回 number 的素因子分解（含前导 1）
pub fn primes(number: usize) -> Vec<usize> {
    assert!(number > 0);
    let mut list = vec![1];
    let mut n = number;
    let mut i = 2;
    while i * i <= n {
        while n % i == 0 {
            list.push(i);
            n /= i;
        }
        i += 1;
    }
    if n > 1 {
        list.push(n);
    }
    list
}

/// 检查最大素因子是否 <= maxprime 且包含所有必需因子
pub fn try_smaller_primes(number: usize, maxprime: usize, required_dividers: &[usize]) -> bool {
    let p = primes(number);
    if *p.iter().max().unwrap() > maxprime {
        return false;
    }
    for k in required_dividers {
        if number % k != 0 {
            return false;
        }
    }
    true
}

/// 最接近且 <= number 的满足 FFT 要求的整数，找不到时返回 0
pub fn smaller_primes(number: usize, maxprime: usize, required_dividers: &[usize]) -> usize {
    let mut n = number;
    while n > 0 && !try_smaller_primes(n, maxprime, required_dividers) {
        n -= 1;
    }
    n
}

/// 最接近且 >= number 的满足 FFT 要求的整数
pub fn higher_primes(number: usize, maxprime: usize, required_dividers: &[usize]) -> usize {
    let mut n = number;
    loop {
        if try_smaller_primes(n, maxprime, required_dividers) {
            return n;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primes_decomposition() {
        assert_eq!(primes(12), vec![1, 2, 2, 3]);
        assert_eq!(primes(7), vec![1, 7]);
        assert_eq!(primes(1), vec![1]);
    }

    #[test]
    fn test_try_smaller_primes() {
        // 128 = 2^7
        assert!(try_smaller_primes(128, 7, &[2]));
        // 11 是素数且 > 7
        assert!(!try_smaller_primes(11, 7, &[]));
        // 63 = 7*9 满足素因子要求但不含因子 2
        assert!(!try_smaller_primes(63, 7, &[2]));
    }

    #[test]
    fn test_smaller_primes() {
        assert_eq!(smaller_primes(100, 7, &[2]), 100);
        // 127 是素数，向下取 126 = 2*3^2*7
        assert_eq!(smaller_primes(127, 7, &[2]), 126);
        assert!(smaller_primes(130, 7, &[2]) <= 130);
    }

    #[test]
    fn test_higher_primes() {
        assert_eq!(higher_primes(100, 7, &[2]), 100);
        // 101 是素数，向上取 104 = 2^3*13？13>7，继续到 105=3*5*7（奇数），108=2^2*27
        assert_eq!(higher_primes(101, 7, &[2]), 108);
        assert!(higher_primes(130, 7, &[2]) >= 130);
    }
}
