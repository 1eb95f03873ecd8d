use alloy::sol;

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    contract GasLedger {
        /// Prepaid gas balance of `user` in micro-USD.
        function userGasAmountInUSD(address user) external view returns (uint256);

        /// Debits `usdAmount` micro-USD from `user`. Reverts on underflow.
        ///
        /// Only callable by an authorized sponsor.
        function deductGas(address user, uint256 usdAmount) external;
    }
}
