//! Interfaces of the contracts we call without an artifact

use alloy::sol;

sol! {
interface ISyncSwapRouter {
    function createPool(address _factory, bytes calldata data) external payable returns (address);
}

interface IPoolFactory {
    event PoolCreated(address indexed token0, address indexed token1, address pool);
}

interface IERC20 {
    function balanceOf(address account) external view returns (uint256);

    function transfer(address to, uint256 amount) external returns (bool);
}

interface IOwnable {
    function owner() external view returns (address);
}
}
